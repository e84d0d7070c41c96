#![warn(clippy::all, missing_docs)]

//! Core domain logic for the peloton fantasy tour manager.
//!
//! This crate hosts the rider catalog, scoring overlay, roster engine,
//! manager registry, share encoding, configuration, and persistence
//! layers used by the terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod overlay;
pub mod registry;
pub mod roster;
pub mod scoring;
pub mod share;
pub mod store;

pub use catalog::Catalog;
pub use config::AppConfig;
pub use error::{CoreError, ValidationError};
pub use feed::{DataFeed, RefreshOutcome};
pub use models::{Rider, RiderStats, Roster};
pub use registry::{RankEntry, Registry, RegistrySnapshot};
pub use roster::RosterRules;
pub use share::SharePayload;
pub use store::StateStore;
