pub mod application;
pub mod settings;
pub mod upload;

pub use application::*;
pub use settings::*;
pub use upload::*;
