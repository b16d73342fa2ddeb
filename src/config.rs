//! Service configuration.

use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;

use crate::error::Error;
use crate::openapi::Info;

/// Everything [`Api`](crate::Api) needs to know before it listens.
///
/// Deserialisable, so it can live in a JSON config file; every field has a
/// default. [`Config::from_env`] reads `USECASE_*` variables instead.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Interface both listeners bind to.
    pub host: IpAddr,
    pub api_port: u16,
    pub docs_port: u16,
    /// Where the docs listener serves the UI; the schema sits at
    /// `{docs_prefix}/openapi.json`.
    pub docs_prefix: String,
    pub info: Info,
    /// Registers `/healthz` and `/readyz` on the API listener.
    pub health_checks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            api_port: 8001,
            docs_port: 3000,
            docs_prefix: "/swagger".to_owned(),
            info: Info::default(),
            health_checks: false,
        }
    }
}

impl Config {
    pub fn new(api_port: u16, docs_port: u16) -> Self {
        Self { api_port, docs_port, ..Self::default() }
    }

    /// Defaults overridden by whichever of these are set:
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `USECASE_HOST` | `host` |
    /// | `USECASE_API_PORT` | `api_port` |
    /// | `USECASE_DOCS_PORT` | `docs_port` |
    /// | `USECASE_DOCS_PREFIX` | `docs_prefix` |
    /// | `USECASE_TITLE` | `info.title` |
    /// | `USECASE_VERSION` | `info.version` |
    /// | `USECASE_DESCRIPTION` | `info.description` |
    /// | `USECASE_HEALTH_CHECKS` | `health_checks` |
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(std::env::vars())
    }

    pub(crate) fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, Error> {
        let mut config = Self::default();
        for (key, value) in vars {
            match key.as_str() {
                "USECASE_HOST" => config.host = parse(&key, &value)?,
                "USECASE_API_PORT" => config.api_port = parse(&key, &value)?,
                "USECASE_DOCS_PORT" => config.docs_port = parse(&key, &value)?,
                "USECASE_DOCS_PREFIX" => config.docs_prefix = value,
                "USECASE_TITLE" => config.info.title = value,
                "USECASE_VERSION" => config.info.version = value,
                "USECASE_DESCRIPTION" => config.info.description = Some(value),
                "USECASE_HEALTH_CHECKS" => config.health_checks = parse(&key, &value)?,
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn api_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.api_port)
    }

    pub fn docs_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.docs_port)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value}: {e}")))
}
