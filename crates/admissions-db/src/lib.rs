//! Admissions Database Library
//!
//! Persistence for applications, committed object references and portal settings.

pub mod db;

pub use db::{
    ApplicationRepository, ApplicationStore, InMemoryApplicationStore, InMemorySettingsStore,
    SettingsRepository, SettingsStore, Stores,
};
