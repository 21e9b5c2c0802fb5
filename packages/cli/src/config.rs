// ABOUTME: Server configuration loaded from the environment
// ABOUTME: Reads CASEBOOK_* variables and applies command-line overrides

use std::env;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use casebook_core::default_database_path;

pub const DEFAULT_PORT: u16 = 4001;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(#[from] AddrParseError),
    #[error("CORS origin must not be empty")]
    EmptyCorsOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors_origin: String,
}

/// Values given on the command line; each one replaces its env counterpart
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("CASEBOOK_PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host = env::var("CASEBOOK_HOST")
            .unwrap_or_else(|_| DEFAULT_HOST.to_string())
            .parse::<IpAddr>()?;

        let db_path = env::var("CASEBOOK_DB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let cors_origin =
            env::var("CASEBOOK_CORS_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());
        if cors_origin.trim().is_empty() {
            return Err(ConfigError::EmptyCorsOrigin);
        }

        Ok(Config {
            host,
            port,
            db_path,
            cors_origin,
        })
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(port) = overrides.port {
            if port == 0 {
                return Err(ConfigError::PortOutOfRange(port));
            }
            self.port = port;
        }
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(db_path) = overrides.db_path {
            self.db_path = db_path;
        }
        if let Some(cors_origin) = overrides.cors_origin {
            if cors_origin.trim().is_empty() {
                return Err(ConfigError::EmptyCorsOrigin);
            }
            self.cors_origin = cors_origin;
        }
        Ok(self)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
