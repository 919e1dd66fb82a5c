use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

/// Storage backend the binary serves from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    S3,
    /// In-process store, nothing survives a restart
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Backend::S3),
            "memory" => Ok(Backend::Memory),
            other => Err(anyhow!("unknown backend '{}', expected 's3' or 'memory'", other)),
        }
    }
}

/// Server settings, separate from the transfer protocol settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub transport_timeout: Duration,
    pub backend: Backend,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            max_body_bytes: 8 * 1024 * 1024,
            transport_timeout: Duration::from_secs(30),
            backend: Backend::S3,
        }
    }
}

impl HttpConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env_var("HTTP_HOST").unwrap_or(defaults.host),
            port: env_parse("HTTP_PORT")?.unwrap_or(defaults.port),
            max_body_bytes: env_parse("HTTP_MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes),
            transport_timeout: env_parse("PRESIGN_TRANSPORT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.transport_timeout),
            backend: env_parse("PRESIGN_BACKEND")?.unwrap_or(defaults.backend),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("{}", e))
                .with_context(|| format!("invalid value for {}: '{}'", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:3030");
        assert_eq!(config.max_body_bytes, 8 * 1024 * 1024);
        assert_eq!(config.backend, Backend::S3);
    }

    #[test]
    fn backend_parsing() {
        assert_eq!("memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert_eq!(" S3 ".parse::<Backend>().unwrap(), Backend::S3);
        assert!("gcs".parse::<Backend>().is_err());
    }
}
