use crate::{Error, Result};
use std::time::Duration;

/// Per-connection text encoding: governs string<->bytes
/// conversions for typed parsers that decode through `charset` (the
/// `string` parser). Raw-bytes variants (`bulk`) bypass it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Ascii,
}

impl Charset {
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|_| Error::Client("invalid UTF-8 in response".to_string())),
            Charset::Ascii => {
                if bytes.iter().all(u8::is_ascii) {
                    Ok(bytes.iter().map(|&b| b as char).collect())
                } else {
                    Err(Error::Client("invalid ASCII in response".to_string()))
                }
            }
        }
    }
}

/// Connection configuration: address, pool sizing, timeouts, and auth.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub max_connections: usize,
    pub charset: Charset,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database_index: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:6379".to_string(),
            max_connections: 10,
            charset: Charset::Utf8,
            connect_timeout: None,
            request_timeout: None,
            username: None,
            password: None,
            database_index: None,
        }
    }
}

impl Config {
    pub fn new(server_address: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            ..Default::default()
        }
    }
}

/// Convenience conversions to [`Config`], so `Client::connect("127.0.0.1:6379")`
/// and `Client::connect(Config { .. })` both work.
pub trait IntoConfig {
    fn into_config(self) -> Result<Config>;
}

impl IntoConfig for Config {
    fn into_config(self) -> Result<Config> {
        Ok(self)
    }
}

impl IntoConfig for &str {
    fn into_config(self) -> Result<Config> {
        Ok(Config::new(self))
    }
}

impl IntoConfig for String {
    fn into_config(self) -> Result<Config> {
        Ok(Config::new(self))
    }
}

impl IntoConfig for (&str, u16) {
    fn into_config(self) -> Result<Config> {
        Ok(Config::new(format!("{}:{}", self.0, self.1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.charset, Charset::Utf8);
        assert!(config.connect_timeout.is_none());
    }

    #[test]
    fn host_port_pair_builds_address() {
        let config = ("127.0.0.1", 6380).into_config().unwrap();
        assert_eq!(config.server_address, "127.0.0.1:6380");
    }
}
