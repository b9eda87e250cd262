use std::env;
use std::fmt;

use anyhow::{Result, bail};

pub const API_KEY_VAR: &str = "LASTFM_API_KEY";
pub const API_SECRET_VAR: &str = "LASTFM_API_SECRET";
pub const USERNAME_VAR: &str = "LASTFM_USERNAME";
pub const PASSWORD_VAR: &str = "LASTFM_PASSWORD";

/// Account credentials for the scrobbling service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Read credentials from the process environment, loading a `.env` file first if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Fails naming the first variable that is unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => bail!("{name} environment variable not set"),
            }
        };

        Ok(Self {
            api_key: get(API_KEY_VAR)?,
            api_secret: get(API_SECRET_VAR)?,
            username: get(USERNAME_VAR)?,
            password: get(PASSWORD_VAR)?,
        })
    }
}
