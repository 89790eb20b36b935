use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::Value;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{default_headers_line, error_result, fenced, request_headers};
use crate::config::Config;
use crate::errors::GraphQLError;
use crate::graphql::{self, Request, document};
use crate::schema_from_type;

/// The name of the tool to execute a GraphQL query or mutation
pub const QUERY_TOOL_NAME: &str = "graphql_query";

const MUTATIONS_DISABLED: &str =
    "Mutation operations are not allowed unless explicitly enabled with allowMutations=true";

/// A tool to execute GraphQL operations against the configured endpoint
#[derive(Clone)]
pub struct GraphQLQuery {
    config: Arc<Config>,
    pub tool: Tool,
}

/// Input for the query tool.
#[derive(Debug, Default, JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    /// The GraphQL query or mutation to execute
    pub query: String,

    /// GraphQL endpoint URL. Defaults to the server's configured endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Variables for the operation, as a JSON object or a JSON-encoded string
    #[schemars(schema_with = "variables")]
    #[serde(default)]
    pub variables: Option<Value>,

    /// Extra HTTP headers for this request. These override the server's default headers.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Request timeout in milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Set to true to allow mutation operations
    #[serde(default)]
    pub allow_mutations: bool,
}

impl GraphQLQuery {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            tool: Tool::new(
                QUERY_TOOL_NAME,
                "Execute a GraphQL query against the endpoint. Use `graphql_introspect` first to learn the schema. Mutations are rejected unless `allowMutations` is true.",
                schema_from_type!(QueryInput),
            ),
        }
    }

    /// Run the query. Every failure is reported in the returned result.
    pub async fn execute(&self, input: QueryInput) -> CallToolResult {
        match self.run(input).await {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "GraphQL query failed");
                error_result(format!(
                    "Error executing GraphQL query: {}",
                    graphql::sanitize_error_message(&error)
                ))
            }
        }
    }

    async fn run(&self, input: QueryInput) -> Result<CallToolResult, GraphQLError> {
        document::parse(&input.query)?;

        if graphql::is_mutation(&input.query) && !input.allow_mutations {
            return Ok(error_result(MUTATIONS_DISABLED));
        }

        let max_complexity = self.config.max_complexity;
        let complexity = graphql::calculate_query_complexity(&input.query, max_complexity);
        if complexity > max_complexity {
            return Ok(error_result(format!(
                "Query complexity ({complexity}) exceeds maximum allowed ({max_complexity})"
            )));
        }

        let variables = match graphql::decode_variables(input.variables) {
            Ok(variables) => variables.map(Value::Object),
            Err(error) => return Ok(error_result(error.to_string())),
        };

        let endpoint = input
            .endpoint
            .as_deref()
            .unwrap_or_else(|| self.config.endpoint.as_str());
        let timeout = input
            .timeout
            .map_or(self.config.timeout, Duration::from_millis);
        debug!(endpoint, complexity, "Executing GraphQL query");

        let started = Instant::now();
        let response = graphql::execute_graphql_query(Request {
            endpoint,
            query: &input.query,
            variables,
            default_headers: &self.config.headers,
            headers: request_headers(input.headers.as_ref())?,
            timeout,
        })
        .await?;
        let elapsed = started.elapsed();

        if let Some(messages) = response.error_messages() {
            return Ok(error_result(GraphQLError::Response(messages).to_string()));
        }

        let data = serde_json::to_string_pretty(&response.data.unwrap_or(Value::Null))
            .unwrap_or_else(|_| "null".to_string());
        let content = [
            Some(format!(
                "Query executed successfully in {}ms at {endpoint}",
                elapsed.as_millis()
            )),
            default_headers_line(&self.config),
            Some(fenced(
                "graphql",
                &graphql::format_graphql_query(&input.query),
            )),
            Some(fenced("json", &data)),
        ]
        .into_iter()
        .flatten()
        .map(Content::text)
        .collect();

        Ok(CallToolResult::success(content))
    }
}

fn variables(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
    /// Operation variables
    #[derive(JsonSchema)]
    #[schemars(untagged)]
    // Only used to describe the accepted shapes
    #[allow(dead_code)]
    enum Variables {
        Object(serde_json::Map<String, Value>),
        Encoded(String),
    }

    Option::<Variables>::json_schema(generator)
}
