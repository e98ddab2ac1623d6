//! # dbal-rs-core
//!
//! Core types, settings, logging, timezone handling, and error types for
//! dbal-rs. This crate has no dependency on any driver or platform and
//! provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`timezone`] - Fixed-offset and named timezones used by normalizers

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod timezone;

// Re-export the most commonly used types at the crate root.
pub use error::{DbalError, DbalResult};
pub use settings::Settings;
pub use timezone::{TimeZones, Zone};
