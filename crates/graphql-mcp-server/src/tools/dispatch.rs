//! Route tool calls to their handlers

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt as _;
use rmcp::model::{CallToolResult, JsonObject};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

use super::{
    GraphQLIntrospect, GraphQLQuery, INTROSPECT_TOOL_NAME, IntrospectInput, QUERY_TOOL_NAME,
    QueryInput, error_result,
};

/// A tool call whose arguments have been validated against the tool's input
#[derive(Debug)]
pub enum ToolInvocation {
    Query(QueryInput),
    Introspect(IntrospectInput),
}

/// Why a tool call could not be turned into a [`ToolInvocation`]
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {name}: {source}")]
    InvalidArguments {
        name: String,
        source: serde_json::Error,
    },
}

impl ToolInvocation {
    /// Parse the arguments of a named tool call. Absent arguments are treated
    /// as an empty object.
    pub fn parse(name: &str, arguments: Option<JsonObject>) -> Result<Self, InvocationError> {
        let arguments = Value::Object(arguments.unwrap_or_default());
        match name {
            QUERY_TOOL_NAME => arguments_for(name, arguments).map(Self::Query),
            INTROSPECT_TOOL_NAME => arguments_for(name, arguments).map(Self::Introspect),
            _ => Err(InvocationError::UnknownTool(name.to_string())),
        }
    }
}

fn arguments_for<T: DeserializeOwned>(name: &str, arguments: Value) -> Result<T, InvocationError> {
    serde_json::from_value(arguments).map_err(|source| InvocationError::InvalidArguments {
        name: name.to_string(),
        source,
    })
}

/// Run a tool call against the matching handler.
///
/// Every outcome is a tool result, including unknown tools, bad arguments,
/// and handlers that panic.
pub async fn dispatch(
    query: &GraphQLQuery,
    introspect: &GraphQLIntrospect,
    name: &str,
    arguments: Option<JsonObject>,
) -> CallToolResult {
    let invocation = match ToolInvocation::parse(name, arguments) {
        Ok(invocation) => invocation,
        Err(error @ InvocationError::InvalidArguments { .. }) => {
            return error_result(format!("Error: {error}"));
        }
        Err(error) => return error_result(error.to_string()),
    };

    let handled = match invocation {
        ToolInvocation::Query(input) => AssertUnwindSafe(query.execute(input))
            .catch_unwind()
            .await,
        ToolInvocation::Introspect(input) => AssertUnwindSafe(introspect.execute(input))
            .catch_unwind()
            .await,
    };

    handled.unwrap_or_else(|panic| {
        let message = panic_message(panic.as_ref());
        error!(tool = name, %message, "Tool handler panicked");
        error_result(format!("Error: {message}"))
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown error".to_string())
}
