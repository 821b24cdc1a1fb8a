use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::listview::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub session_token: Option<String>,
}

impl Config {
    // Read from the process environment (after .env has been loaded)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let page_size = match lookup("PAGE_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "PAGE_SIZE",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS",
                value: raw.clone(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let session_token = lookup("SESSION_TOKEN").filter(|t| !t.is_empty());

        Ok(Self {
            api_base_url,
            page_size,
            request_timeout: Duration::from_secs(timeout_secs),
            session_token,
        })
    }
}
