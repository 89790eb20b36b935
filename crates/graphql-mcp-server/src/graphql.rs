//! Execute GraphQL operations against a remote endpoint

pub mod document;

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::GraphQLError;

pub use document::{calculate_query_complexity, format_graphql_query, is_mutation};

/// A GraphQL request ready to be sent
pub struct Request<'a> {
    pub endpoint: &'a str,
    pub query: &'a str,
    pub variables: Option<Value>,
    /// Headers applied to every request, overridden by `headers`
    pub default_headers: &'a HeaderMap,
    /// Headers given for this request only
    pub headers: HeaderMap,
    /// Zero disables the timeout
    pub timeout: Duration,
}

/// The body of a GraphQL response
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub errors: Option<Vec<ResponseError>>,
}

/// A single entry of a response's `errors` array
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ResponseError {
    #[serde(default)]
    pub message: String,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl GraphQLResponse {
    /// All error messages joined with `", "`, or `None` if there are no errors
    pub fn error_messages(&self) -> Option<String> {
        self.errors
            .as_ref()
            .filter(|errors| !errors.is_empty())
            .map(|errors| {
                errors
                    .iter()
                    .map(|error| error.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
    }
}

/// Execute a query, returning the decoded response body.
///
/// A non-success HTTP status is reported as [`GraphQLError::Status`]. Errors
/// carried in the response body are left for the caller to inspect.
pub async fn execute_graphql_query(request: Request<'_>) -> Result<GraphQLResponse, GraphQLError> {
    let mut body = Map::new();
    body.insert("query".to_string(), Value::String(request.query.to_string()));
    if let Some(variables) = decode_variables(request.variables)? {
        body.insert("variables".to_string(), Value::Object(variables));
    }

    let headers = merge_headers([
        request.default_headers,
        &request.headers,
        &protocol_headers(),
    ]);
    post(request.endpoint, &Value::Object(body), headers, request.timeout).await
}

/// POST a JSON body to a GraphQL endpoint
pub(crate) async fn post(
    endpoint: &str,
    body: &Value,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<GraphQLResponse, GraphQLError> {
    let mut request = reqwest::Client::new()
        .post(endpoint)
        .headers(headers)
        .body(body.to_string());
    if !timeout.is_zero() {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(%status, body = %body, "GraphQL endpoint responded with an error status");
        return Err(GraphQLError::Status(status));
    }

    Ok(response.json::<GraphQLResponse>().await?)
}

/// The headers every GraphQL request must carry
pub fn protocol_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Merge header maps in order. A name present in a later map replaces every
/// value an earlier map had for it.
pub fn merge_headers<'a>(layers: impl IntoIterator<Item = &'a HeaderMap>) -> HeaderMap {
    let mut merged = HeaderMap::new();
    for layer in layers {
        let mut replaced = HashSet::new();
        for (name, value) in layer {
            if replaced.insert(name.clone()) {
                merged.remove(name);
            }
            merged.append(name.clone(), value.clone());
        }
    }
    merged
}

/// Build a header map from name/value pairs, validating both
pub fn header_map<K, V>(
    pairs: impl IntoIterator<Item = (K, V)>,
) -> Result<HeaderMap, GraphQLError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_str(name.as_ref())?,
            HeaderValue::from_str(value.as_ref())?,
        );
    }
    Ok(headers)
}

/// Normalize tool-supplied variables into a JSON object.
///
/// Variables may arrive as an object or as a JSON-encoded string; `null` and
/// absent both mean no variables.
pub fn decode_variables(
    variables: Option<Value>,
) -> Result<Option<Map<String, Value>>, GraphQLError> {
    let variables = match variables {
        Some(Value::String(encoded)) => serde_json::from_str(&encoded)
            .map_err(|e| GraphQLError::Variables(e.to_string()))?,
        Some(other) => other,
        None => Value::Null,
    };

    match variables {
        Value::Null => Ok(None),
        Value::Object(object) => Ok(Some(object)),
        other => Err(GraphQLError::Variables(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Turn any request failure into a single human-readable line
pub fn sanitize_error_message(error: &GraphQLError) -> String {
    match error {
        GraphQLError::Status(status) => format!(
            "Server responded with status {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ),
        GraphQLError::Http(error) => match error.status() {
            Some(status) => format!(
                "Server responded with status {}: {}",
                status.as_u16(),
                with_causes(error)
            ),
            None if error.is_timeout() || error.is_connect() || error.is_request() => {
                format!("No response received: {}", with_causes(error))
            }
            None => with_causes(error),
        },
        other => other.to_string(),
    }
}

/// An error's message followed by the messages of everything that caused it
fn with_causes(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
