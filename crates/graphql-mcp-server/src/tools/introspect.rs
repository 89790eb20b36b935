use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars;
use rmcp::schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{default_headers_line, error_result, fenced, request_headers};
use crate::config::Config;
use crate::errors::GraphQLError;
use crate::graphql::sanitize_error_message;
use crate::introspection::{SchemaRequest, fetch_graphql_schema};
use crate::schema_from_type;

/// The name of the tool to introspect the GraphQL schema
pub const INTROSPECT_TOOL_NAME: &str = "graphql_introspect";

/// A tool to fetch the schema of a GraphQL endpoint as SDL
#[derive(Clone)]
pub struct GraphQLIntrospect {
    config: Arc<Config>,
    pub tool: Tool,
}

/// Input for the introspect tool.
#[derive(Debug, JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectInput {
    /// GraphQL endpoint URL. Defaults to the server's configured endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Extra HTTP headers for this request. These override the server's default headers.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Whether to include deprecated arguments and input fields. Defaults to true.
    #[serde(default = "include_deprecated")]
    pub include_deprecated: bool,
}

impl Default for IntrospectInput {
    fn default() -> Self {
        Self {
            endpoint: None,
            headers: None,
            include_deprecated: include_deprecated(),
        }
    }
}

fn include_deprecated() -> bool {
    true
}

impl GraphQLIntrospect {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            tool: Tool::new(
                INTROSPECT_TOOL_NAME,
                "Introspect a GraphQL endpoint and return its schema in SDL format. Use this to learn the available types and fields before writing queries.",
                schema_from_type!(IntrospectInput),
            ),
        }
    }

    /// Fetch the schema. Every failure is reported in the returned result.
    pub async fn execute(&self, input: IntrospectInput) -> CallToolResult {
        let endpoint = input
            .endpoint
            .as_deref()
            .unwrap_or_else(|| self.config.endpoint.as_str());

        match self.introspect(endpoint, &input).await {
            Ok(sdl) => {
                let content = [
                    Some(format!(
                        "Schema introspection from {endpoint} completed successfully"
                    )),
                    default_headers_line(&self.config),
                    Some(fenced("graphql", &sdl)),
                ]
                .into_iter()
                .flatten()
                .map(Content::text)
                .collect();
                CallToolResult::success(content)
            }
            Err(error) => {
                warn!(%error, endpoint, "GraphQL introspection failed");
                error_result(format!(
                    "Error introspecting GraphQL schema: {}",
                    sanitize_error_message(&error)
                ))
            }
        }
    }

    async fn introspect(
        &self,
        endpoint: &str,
        input: &IntrospectInput,
    ) -> Result<String, GraphQLError> {
        debug!(endpoint, "Introspecting GraphQL schema");
        let fetched = fetch_graphql_schema(SchemaRequest {
            endpoint,
            default_headers: &self.config.headers,
            headers: request_headers(input.headers.as_ref())?,
            include_deprecated: input.include_deprecated,
            timeout: self.config.timeout,
        })
        .await?;
        Ok(fetched.schema.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{is_error, texts};
    use mockito::{Matcher, Server};
    use rmcp::serde_json::{Value, json};

    const INTROSPECTION: &str = r#"{
        "data": {
            "__schema": {
                "queryType": {"name": "Query"},
                "mutationType": null,
                "subscriptionType": null,
                "types": [
                    {
                        "kind": "OBJECT",
                        "name": "Query",
                        "description": null,
                        "fields": [{
                            "name": "book",
                            "description": null,
                            "args": [{
                                "name": "id",
                                "description": null,
                                "type": {"kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "ID", "ofType": null}},
                                "defaultValue": null
                            }],
                            "type": {"kind": "OBJECT", "name": "Book", "ofType": null},
                            "isDeprecated": false,
                            "deprecationReason": null
                        }],
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": null,
                        "possibleTypes": null
                    },
                    {
                        "kind": "OBJECT",
                        "name": "Book",
                        "description": "A book",
                        "fields": [{
                            "name": "title",
                            "description": null,
                            "args": [],
                            "type": {"kind": "SCALAR", "name": "String", "ofType": null},
                            "isDeprecated": false,
                            "deprecationReason": null
                        }],
                        "inputFields": null,
                        "interfaces": [],
                        "enumValues": null,
                        "possibleTypes": null
                    },
                    {
                        "kind": "SCALAR",
                        "name": "ID",
                        "description": null,
                        "fields": null,
                        "inputFields": null,
                        "interfaces": null,
                        "enumValues": null,
                        "possibleTypes": null
                    },
                    {
                        "kind": "SCALAR",
                        "name": "String",
                        "description": null,
                        "fields": null,
                        "inputFields": null,
                        "interfaces": null,
                        "enumValues": null,
                        "possibleTypes": null
                    }
                ],
                "directives": []
            }
        }
    }"#;

    fn tool(config: Config) -> GraphQLIntrospect {
        GraphQLIntrospect::new(Arc::new(config))
    }

    fn config(endpoint: &str) -> Config {
        Config::builder()
            .endpoint(endpoint.parse().unwrap())
            .build()
    }

    #[test]
    fn tool_requires_nothing() {
        let tool = tool(Config::default());
        let schema = Value::Object(tool.tool.input_schema.as_ref().clone());

        assert_eq!(tool.tool.name, INTROSPECT_TOOL_NAME);
        assert!(
            schema
                .get("required")
                .and_then(Value::as_array)
                .is_none_or(Vec::is_empty)
        );
        assert!(schema["properties"].get("includeDeprecated").is_some());
    }

    #[test]
    fn include_deprecated_defaults_to_true() {
        let input: IntrospectInput = serde_json::from_value(json!({})).unwrap();
        assert!(input.include_deprecated);
        assert!(IntrospectInput::default().include_deprecated);
    }

    #[tokio::test]
    async fn returns_the_schema_as_sdl() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(
                json!({"operationName": "IntrospectionQuery"}),
            ))
            .with_status(200)
            .with_body(INTROSPECTION)
            .create_async()
            .await;

        let result = tool(config(&server.url()))
            .execute(IntrospectInput::default())
            .await;

        mock.assert_async().await;
        assert!(!is_error(&result));
        let texts = texts(&result);
        assert_eq!(texts.len(), 2);
        assert_eq!(
            texts[0],
            format!(
                "Schema introspection from {}/ completed successfully",
                server.url()
            )
        );
        assert!(texts[1].starts_with("```graphql\n"));
        assert!(texts[1].ends_with("\n```"));
        assert!(texts[1].contains("book(id: ID!): Book"));
        assert!(texts[1].contains("\"A book\""));
    }

    #[tokio::test]
    async fn introspecting_twice_yields_identical_sdl() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(INTROSPECTION)
            .expect(2)
            .create_async()
            .await;

        let tool = tool(config(&server.url()));
        let first = tool.execute(IntrospectInput::default()).await;
        let second = tool.execute(IntrospectInput::default()).await;

        assert_eq!(texts(&first), texts(&second));
    }

    #[tokio::test]
    async fn reports_graphql_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"errors":[{"message":"Introspection is disabled"}]}"#)
            .create_async()
            .await;

        let result = tool(config(&server.url()))
            .execute(IntrospectInput::default())
            .await;

        assert!(is_error(&result));
        assert_eq!(
            texts(&result),
            vec![
                "Error introspecting GraphQL schema: GraphQL server returned errors: Introspection is disabled"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn reports_error_statuses() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(404)
            .create_async()
            .await;

        let result = tool(config(&server.url()))
            .execute(IntrospectInput::default())
            .await;

        assert!(is_error(&result));
        assert_eq!(
            texts(&result),
            vec![
                "Error introspecting GraphQL schema: Server responded with status 404: Not Found"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn lists_default_headers_and_honors_overrides() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer request")
            .match_header("x-team", "core")
            .with_status(200)
            .with_body(INTROSPECTION)
            .create_async()
            .await;

        let tool = tool(
            Config::builder()
                .headers(
                    crate::config::DefaultHeaders::from_pairs([
                        ("Authorization", "Bearer default"),
                        ("X-Team", "core"),
                    ])
                    .unwrap(),
                )
                .build(),
        );
        let result = tool
            .execute(IntrospectInput {
                endpoint: Some(format!("{}/graphql", server.url())),
                headers: Some(HashMap::from([(
                    "authorization".to_string(),
                    "Bearer request".to_string(),
                )])),
                include_deprecated: false,
            })
            .await;

        mock.assert_async().await;
        assert!(!is_error(&result));
        let texts = texts(&result);
        assert_eq!(texts.len(), 3);
        assert!(texts[1].starts_with("Using default headers: "));
    }
}
