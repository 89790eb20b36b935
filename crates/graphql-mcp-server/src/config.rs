//! Process-wide configuration shared by every tool call

use std::ops::Deref;
use std::time::Duration;

use bon::Builder;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

use crate::endpoint::Endpoint;
use crate::errors::GraphQLError;
use crate::graphql::header_map;

/// Defaults applied when neither a flag nor an environment variable is set
pub mod defaults {
    /// Request timeout in milliseconds
    pub const TIMEOUT_MS: u64 = 30_000;

    /// Maximum number of field selections allowed in a single query
    pub const MAX_COMPLEXITY: usize = 100;
}

/// Immutable server configuration.
///
/// Built once at startup and shared read-only with every handler. Tool calls
/// may override the endpoint, headers, and timeout per request; the values
/// here are the fallbacks.
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// The GraphQL endpoint used when a tool call does not name one
    #[builder(default)]
    pub endpoint: Endpoint,

    /// Headers sent with every GraphQL request
    #[builder(default)]
    pub headers: DefaultHeaders,

    /// Request timeout used when a tool call does not give one
    #[builder(default = Duration::from_millis(defaults::TIMEOUT_MS))]
    pub timeout: Duration,

    /// Queries with more field selections than this are rejected
    #[builder(default = defaults::MAX_COMPLEXITY)]
    pub max_complexity: usize,

    /// Server version reported to MCP clients
    #[builder(default = env!("CARGO_PKG_VERSION").to_string(), into)]
    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Config {
    /// The default headers as pretty-printed JSON, or `None` when there are none
    pub fn default_headers_json(&self) -> Option<String> {
        self.headers.to_pretty_json()
    }
}

/// Headers sent with every request.
///
/// Derefs to the validated [`HeaderMap`]. The names are also kept as they were
/// configured, since `HeaderMap` lowercases them.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    configured: Vec<(String, String)>,
    map: HeaderMap,
}

impl DefaultHeaders {
    /// Validate name/value pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, GraphQLError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let configured: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        let map = header_map(configured.iter().map(|(name, value)| (name, value)))?;
        Ok(Self { configured, map })
    }

    /// Pretty-printed JSON object of the headers as configured
    pub fn to_pretty_json(&self) -> Option<String> {
        if self.configured.is_empty() {
            return None;
        }

        let headers: Map<String, Value> = self
            .configured
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        serde_json::to_string_pretty(&headers).ok()
    }
}

impl Deref for DefaultHeaders {
    type Target = HeaderMap;

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

/// Parse the `--headers` flag value: a JSON object of string header values
pub fn parse_headers_json(raw: &str) -> Result<DefaultHeaders, GraphQLError> {
    let value: Value = serde_json::from_str(raw).map_err(GraphQLError::Headers)?;
    let Value::Object(object) = value else {
        return Err(GraphQLError::InvalidHeaders(
            "expected a JSON object".to_string(),
        ));
    };

    let pairs = object
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(value) => Ok((name, value)),
            other => Err(GraphQLError::InvalidHeaders(format!(
                "value for `{name}` must be a string, got {other}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    DefaultHeaders::from_pairs(pairs)
}
