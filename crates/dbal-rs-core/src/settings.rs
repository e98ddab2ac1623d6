//! Settings for dbal-rs.
//!
//! This module provides the [`Settings`] struct, which holds connection
//! definitions, the application timezone, metadata cache configuration and
//! logging options.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DbalError, DbalResult};
use crate::timezone::{TimeZones, Zone};

/// The value of `connection_time_zone` that means "same as the application".
pub const AUTO_TIME_ZONE: &str = "auto";

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The database engine (`mysql` or `pgsql`).
    pub engine: String,
    /// The database name.
    pub name: String,
    /// The database user.
    pub user: String,
    /// The database password.
    pub password: String,
    /// The database host.
    pub host: String,
    /// The database port.
    pub port: u16,
    /// The session timezone the server renders zone-less values in.
    ///
    /// `None` or `"auto"` means the application timezone.
    pub connection_time_zone: Option<String>,
    /// Additional engine-specific options.
    pub options: HashMap<String, String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "mysql".to_string(),
            name: String::new(),
            user: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 3306,
            connection_time_zone: None,
            options: HashMap::new(),
        }
    }
}

/// Platform metadata cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// The schema-version tag prefixed to every cache key.
    ///
    /// Changing it makes every previously stored entry unreachable.
    pub version: String,
    /// Entry lifetime in seconds; `None` keeps entries until cleared.
    pub timeout: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            version: "v2".to_string(),
            timeout: None,
        }
    }
}

/// The complete set of dbal-rs settings.
///
/// # Examples
///
/// ```
/// use dbal_rs_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.time_zone, "UTC");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Database ─────────────────────────────────────────────────────

    /// Database configurations, keyed by alias (e.g. "default").
    pub databases: HashMap<String, DatabaseSettings>,

    // ── Internationalization ─────────────────────────────────────────

    /// The application timezone results are expressed in.
    pub time_zone: String,

    // ── Cache ────────────────────────────────────────────────────────

    /// Platform metadata cache configuration.
    pub cache: CacheSettings,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,
    /// How many executed queries each connection keeps in its query log.
    /// Zero disables the log.
    pub query_log_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let mut databases = HashMap::new();
        databases.insert("default".to_string(), DatabaseSettings::default());

        Self {
            debug: true,
            databases,
            time_zone: "UTC".to_string(),
            cache: CacheSettings::default(),
            log_level: "info".to_string(),
            query_log_size: 100,
        }
    }
}

impl Settings {
    /// Parses the application timezone.
    pub fn application_zone(&self) -> DbalResult<Zone> {
        self.time_zone.parse()
    }

    /// Builds the connection/application zone pair for a database alias.
    pub fn time_zones(&self, alias: &str) -> DbalResult<TimeZones> {
        let database = self.databases.get(alias).ok_or_else(|| {
            DbalError::ConfigurationError(format!("Unknown database alias '{alias}'"))
        })?;
        let application = self.application_zone()?;
        let connection = match database.connection_time_zone.as_deref() {
            None | Some(AUTO_TIME_ZONE) => application,
            Some(name) => name.parse()?,
        };
        Ok(TimeZones::new(connection, application))
    }
}
