//! MCP tools to allow an AI agent to query and introspect a GraphQL endpoint.

pub mod dispatch;
pub mod introspect;
pub mod query;

use std::collections::HashMap;

use reqwest::header::HeaderMap;
use rmcp::model::{CallToolResult, Content};

use crate::config::Config;
use crate::errors::GraphQLError;
use crate::graphql::header_map;

pub use dispatch::ToolInvocation;
pub use introspect::{GraphQLIntrospect, INTROSPECT_TOOL_NAME, IntrospectInput};
pub use query::{GraphQLQuery, QUERY_TOOL_NAME, QueryInput};

/// A failed tool call with a single text block
pub(crate) fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// The line advertising the configured default headers, if there are any
pub(crate) fn default_headers_line(config: &Config) -> Option<String> {
    config
        .default_headers_json()
        .map(|headers| format!("Using default headers: {headers}"))
}

/// Validate the headers given for a single tool call
pub(crate) fn request_headers(
    headers: Option<&HashMap<String, String>>,
) -> Result<HeaderMap, GraphQLError> {
    match headers {
        Some(headers) => header_map(headers),
        None => Ok(HeaderMap::new()),
    }
}

pub(crate) fn fenced(language: &str, body: &str) -> String {
    format!("```{language}\n{body}\n```")
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::ops::Deref;

    use rmcp::model::{CallToolResult, RawContent};

    /// The text of every content block of a tool result
    pub fn texts(result: &CallToolResult) -> Vec<String> {
        result
            .content
            .iter()
            .map(|content| match content.deref() {
                RawContent::Text(text) => text.text.clone(),
                _ => panic!("expected text content"),
            })
            .collect()
    }

    pub fn is_error(result: &CallToolResult) -> bool {
        result.is_error.unwrap_or(false)
    }
}
