use super::Error;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_USERS_FILE: &str = "users.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `host:port` the HTTP server listens on (`BIND_ADDRESS`).
    pub bind_address: String,
    /// JSON user list (`USERS_FILE`).
    pub users_file: PathBuf,
}

impl Config {
    /// Reads the configuration from the environment, after loading `.env`
    /// if one exists.
    pub fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        match bind_address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => (),
            _ => {
                return Err(Error::Config(format!(
                    "BIND_ADDRESS must be host:port, got {:?}",
                    bind_address
                )))
            }
        }

        let users_file = match var("USERS_FILE") {
            Some(v) if v.trim().is_empty() => {
                return Err(Error::Config("USERS_FILE must not be empty".to_string()))
            }
            Some(v) => PathBuf::from(v),
            None => PathBuf::from(DEFAULT_USERS_FILE),
        };

        Ok(Self {
            bind_address,
            users_file,
        })
    }
}
