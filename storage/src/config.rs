//! Database config: driver, MySQL target, SQLite location, timeouts, error policy. Loaded from env.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::StorageError;

const DEFAULT_HOST: &str = "mysql";
const DEFAULT_PORT: u16 = 3306;
const DEFAULT_DATABASE: &str = "lamp_db";
const DEFAULT_USERNAME: &str = "lamp_user";
const DEFAULT_PASSWORD: &str = "lamp_password";
const DEFAULT_CHARSET: &str = "utf8mb4";
const DEFAULT_SQLITE_PATH: &str = "./data/lamp.db";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Backend the handle is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    MySql,
    Sqlite,
}

impl DatabaseDriver {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseDriver::MySql => "mysql",
            DatabaseDriver::Sqlite => "sqlite",
        }
    }
}

impl FromStr for DatabaseDriver {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(DatabaseDriver::MySql),
            "sqlite" => Ok(DatabaseDriver::Sqlite),
            other => Err(StorageError::Configuration(format!(
                "DB_DRIVER must be 'mysql' or 'sqlite', got '{}'",
                other
            ))),
        }
    }
}

/// What [`MessageStore`](crate::MessageStore) does when a statement fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure and return `false` / empty / `0` / `None`.
    #[default]
    Sentinel,
    /// Return the failure as `Err(StorageError)`.
    Propagate,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Sentinel => "sentinel",
            ErrorPolicy::Propagate => "propagate",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sentinel" => Ok(ErrorPolicy::Sentinel),
            "propagate" => Ok(ErrorPolicy::Propagate),
            other => Err(StorageError::Configuration(format!(
                "LAMP_ERROR_POLICY must be 'sentinel' or 'propagate', got '{}'",
                other
            ))),
        }
    }
}

/// Statement behavior of every handle. Not configurable; sqlx drivers always
/// surface errors, map rows by column name and prepare statements server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionOptions {
    pub fail_on_error: bool,
    pub named_rows: bool,
    pub emulate_prepares: bool,
}

impl ConnectionOptions {
    pub const FIXED: ConnectionOptions = ConnectionOptions {
        fail_on_error: true,
        named_rows: true,
        emulate_prepares: false,
    };
}

/// Connection settings, loaded once and immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// DB_DRIVER
    pub driver: DatabaseDriver,
    /// MYSQL_HOST
    pub host: String,
    /// MYSQL_PORT
    pub port: u16,
    /// MYSQL_DATABASE
    pub database: String,
    /// MYSQL_USER
    pub username: String,
    /// MYSQL_PASSWORD
    pub password: String,
    /// MYSQL_CHARSET
    pub charset: String,
    /// SQLITE_PATH: file path or `sqlite:` URL, used when driver is sqlite
    pub sqlite_path: String,
    /// DB_CONNECT_TIMEOUT_SECS
    pub connect_timeout: Duration,
    /// LAMP_ERROR_POLICY
    pub error_policy: ErrorPolicy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::MySql,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl DatabaseConfig {
    /// Load from environment variables, falling back to defaults for unset or empty values.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let driver = match get("DB_DRIVER") {
            Some(v) => v.parse()?,
            None => defaults.driver,
        };
        let port = match get("MYSQL_PORT") {
            Some(v) => v.trim().parse().map_err(|_| {
                StorageError::Configuration(format!("MYSQL_PORT is not a valid port: {}", v))
            })?,
            None => defaults.port,
        };
        let connect_timeout = match get("DB_CONNECT_TIMEOUT_SECS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(StorageError::Configuration(format!(
                        "DB_CONNECT_TIMEOUT_SECS must be a positive number of seconds: {}",
                        v
                    )))
                }
            },
            None => defaults.connect_timeout,
        };
        let error_policy = match get("LAMP_ERROR_POLICY") {
            Some(v) => v.parse()?,
            None => defaults.error_policy,
        };

        Ok(Self {
            driver,
            host: get("MYSQL_HOST").unwrap_or(defaults.host),
            port,
            database: get("MYSQL_DATABASE").unwrap_or(defaults.database),
            username: get("MYSQL_USER").unwrap_or(defaults.username),
            password: get("MYSQL_PASSWORD").unwrap_or(defaults.password),
            charset: get("MYSQL_CHARSET").unwrap_or(defaults.charset),
            sqlite_path: get("SQLITE_PATH").unwrap_or(defaults.sqlite_path),
            connect_timeout,
            error_policy,
        })
    }

    /// SQLite config for the given file path or `sqlite:` URL; other fields keep their defaults.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: DatabaseDriver::Sqlite,
            sqlite_path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn options(&self) -> ConnectionOptions {
        ConnectionOptions::FIXED
    }

    /// Human-readable target without credentials, e.g. `mysql://mysql:3306/lamp_db`.
    pub fn target(&self) -> String {
        match self.driver {
            DatabaseDriver::MySql => {
                format!("mysql://{}:{}/{}", self.host, self.port, self.database)
            }
            DatabaseDriver::Sqlite => {
                format!("sqlite:{}", self.sqlite_path.trim_start_matches("sqlite:"))
            }
        }
    }

    /// Directory the SQLite file lives in, when the driver is sqlite and the path is a plain
    /// file path with a parent. `None` for MySQL, `sqlite:` URLs and bare file names.
    pub fn sqlite_dir(&self) -> Option<PathBuf> {
        if self.driver != DatabaseDriver::Sqlite || self.sqlite_path.starts_with("sqlite:") {
            return None;
        }
        Path::new(&self.sqlite_path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.driver {
            DatabaseDriver::MySql => write!(
                f,
                "{} (user={}, password={}, charset={})",
                self.target(),
                self.username,
                mask_secret(&self.password),
                self.charset
            ),
            DatabaseDriver::Sqlite => write!(f, "{}", self.target()),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &mask_secret(&self.password))
            .field("charset", &self.charset)
            .field("sqlite_path", &self.sqlite_path)
            .field("connect_timeout", &self.connect_timeout)
            .field("error_policy", &self.error_policy)
            .finish()
    }
}

/// Masks a secret for display: first 2 + "***" + last 2 chars; values of 8 chars or fewer become "***".
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
