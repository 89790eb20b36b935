//! Runtime utilites
//!
//! This module is only used by the main binary and resolves the server
//! configuration from command line flags, the environment, and defaults.

mod logging;

use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Serialized};
use graphql_mcp_server::config::{Config, DefaultHeaders, defaults, parse_headers_json};
use graphql_mcp_server::endpoint::Endpoint;
use graphql_mcp_server::errors::ServerError;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

pub use logging::setup_logging;

/// Settings that can come from the environment
#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub endpoint: String,

    /// Milliseconds
    pub timeout: u64,

    pub max_complexity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default().to_string(),
            timeout: defaults::TIMEOUT_MS,
            max_complexity: defaults::MAX_COMPLEXITY,
        }
    }
}

/// Settings given explicitly on the command line
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_complexity: Option<usize>,
}

/// Layer defaults, the environment, and command line overrides, in that order
#[allow(clippy::result_large_err)]
pub fn read_settings(overrides: &Overrides) -> Result<Settings, figment::Error> {
    Figment::from(Serialized::defaults(Settings::default()))
        .merge(environment())
        .merge(Serialized::defaults(overrides))
        .extract()
}

/// Resolve the configuration the server runs with.
///
/// Malformed default headers are ignored with a warning. An endpoint that is
/// not an absolute URL is an error.
pub fn resolve_config(overrides: &Overrides, headers: Option<&str>) -> Result<Config, ServerError> {
    let settings = read_settings(overrides).map_err(Box::new)?;
    let endpoint = Endpoint::from(Url::parse(&settings.endpoint)?);

    Ok(Config::builder()
        .endpoint(endpoint)
        .headers(headers.map(default_headers).unwrap_or_default())
        .timeout(Duration::from_millis(settings.timeout))
        .max_complexity(settings.max_complexity)
        .build())
}

fn default_headers(raw: &str) -> DefaultHeaders {
    parse_headers_json(raw).unwrap_or_else(|error| {
        warn!(%error, "Ignoring invalid default headers");
        DefaultHeaders::default()
    })
}

/// Figment provider for the unprefixed environment variables the server reads
fn environment() -> Env {
    Env::raw()
        .only(&["endpoint", "timeout", "max_depth"])
        .map(|key| match key.to_string().to_lowercase().as_str() {
            "max_depth" => "max_complexity".into(),
            other => other.to_string().into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;
    use tracing_test::traced_test;

    #[test]
    fn it_uses_defaults() {
        figment::Jail::expect_with(|_jail| {
            let config = resolve_config(&Overrides::default(), None).unwrap();

            assert_eq!(config.endpoint.as_str(), "http://localhost:4000/graphql");
            assert_eq!(config.timeout, Duration::from_millis(30_000));
            assert_eq!(config.max_complexity, 100);
            assert!(config.headers.is_empty());
            Ok(())
        });
    }

    #[test]
    fn it_reads_the_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ENDPOINT", "https://api.example.com/graphql");
            jail.set_env("TIMEOUT", "5000");
            jail.set_env("MAX_DEPTH", "7");

            let config = resolve_config(&Overrides::default(), None).unwrap();

            assert_eq!(config.endpoint.as_str(), "https://api.example.com/graphql");
            assert_eq!(config.timeout, Duration::from_millis(5_000));
            assert_eq!(config.max_complexity, 7);
            Ok(())
        });
    }

    #[test]
    fn it_prioritizes_flags() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ENDPOINT", "https://from-env.example.com/graphql");
            jail.set_env("TIMEOUT", "5000");

            let overrides = Overrides {
                endpoint: Some("https://from-flag.example.com/graphql".to_string()),
                timeout: None,
                max_complexity: Some(3),
            };
            let config = resolve_config(&overrides, None).unwrap();

            assert_eq!(
                config.endpoint.as_str(),
                "https://from-flag.example.com/graphql"
            );
            assert_eq!(config.timeout, Duration::from_millis(5_000));
            assert_eq!(config.max_complexity, 3);
            Ok(())
        });
    }

    #[test]
    fn it_ignores_unrelated_variables() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MAX_COMPLEXITY", "1");

            let config = resolve_config(&Overrides::default(), None).unwrap();

            assert_eq!(config.max_complexity, 100);
            Ok(())
        });
    }

    #[test]
    fn it_rejects_relative_endpoints() {
        figment::Jail::expect_with(|_jail| {
            let overrides = Overrides {
                endpoint: Some("/graphql".to_string()),
                ..Default::default()
            };

            assert!(matches!(
                resolve_config(&overrides, None),
                Err(ServerError::Endpoint(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn it_parses_default_headers() {
        figment::Jail::expect_with(|_jail| {
            let config =
                resolve_config(&Overrides::default(), Some(r#"{"Authorization":"Bearer 1"}"#))
                    .unwrap();
            assert_eq!(config.headers.get(AUTHORIZATION).unwrap(), "Bearer 1");
            Ok(())
        });
    }

    #[test]
    #[traced_test]
    fn it_warns_and_drops_malformed_headers() {
        let headers = default_headers("Authorization: Bearer 1");

        assert!(headers.is_empty());
        assert!(logs_contain("Ignoring invalid default headers"));
    }
}
