//! Bearer-token identity.
//!
//! The portal does not issue credentials itself. It trusts HS256 tokens minted by the
//! identity provider with the shared `JWT_SECRET`.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use models::{CallerContext, JwtClaims, Role};
