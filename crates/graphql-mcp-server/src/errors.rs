use apollo_compiler::{Schema, ast::Document, validation::WithErrors};
use reqwest::StatusCode;
use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use tokio::task::JoinError;

/// A failure while preparing, sending, or interpreting a GraphQL request
#[derive(Debug, thiserror::Error)]
pub enum GraphQLError {
    #[error("{}", describe_diagnostics(.0))]
    Document(Box<WithErrors<Document>>),

    #[error("Failed to parse variables as JSON: {0}")]
    Variables(String),

    #[error("invalid header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    #[error("invalid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("invalid headers JSON: {0}")]
    Headers(serde_json::Error),

    #[error("invalid headers: {0}")]
    InvalidHeaders(String),

    #[error("Request failed with status code {}", .0.as_u16())]
    Status(StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("GraphQL server returned errors: {0}")]
    Response(String),

    #[error("Invalid introspection response: {0}")]
    Introspection(String),

    #[error("Could not build schema from introspection: {}", describe_diagnostics(.0))]
    Schema(Box<WithErrors<Schema>>),
}

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("Failed to initialize MCP transport: {0}")]
    Transport(String),

    #[error("Failed to start server")]
    StartupError(#[from] JoinError),
}

/// Render apollo-compiler diagnostics on a single line
fn describe_diagnostics<T>(errors: &WithErrors<T>) -> String {
    errors
        .errors
        .iter()
        .map(|diagnostic| {
            let error = diagnostic.to_json();
            match error.locations.first() {
                Some(location) => {
                    format!("{} ({}:{})", error.message, location.line, location.column)
                }
                None => error.message,
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// An MCP tool error
pub type McpError = rmcp::model::ErrorData;
