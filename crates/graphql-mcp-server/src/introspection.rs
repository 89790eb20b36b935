//! Fetch a remote GraphQL schema through introspection

pub mod client_schema;
pub mod query;

use std::time::Duration;

use apollo_compiler::Schema;
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use tracing::debug;

use crate::errors::GraphQLError;
use crate::graphql::{self, merge_headers, protocol_headers};

pub use client_schema::IntrospectionSchema;
pub use query::introspection_query;

/// An introspection request
pub struct SchemaRequest<'a> {
    pub endpoint: &'a str,
    pub default_headers: &'a HeaderMap,
    pub headers: HeaderMap,
    pub include_deprecated: bool,
    pub timeout: Duration,
}

/// A schema built from a remote endpoint's introspection result
#[derive(Debug)]
pub struct FetchedSchema {
    pub schema: Schema,
    /// The `data` of the introspection response, as received
    pub introspection: Value,
}

/// Introspect an endpoint and build its schema.
///
/// GraphQL errors in the response fail the fetch even when the HTTP status
/// was successful.
pub async fn fetch_graphql_schema(
    request: SchemaRequest<'_>,
) -> Result<FetchedSchema, GraphQLError> {
    let body = json!({
        "query": introspection_query(request.include_deprecated),
        "operationName": "IntrospectionQuery",
    });
    let headers = merge_headers([
        request.default_headers,
        &request.headers,
        &protocol_headers(),
    ]);

    let response = graphql::post(request.endpoint, &body, headers, request.timeout).await?;
    if let Some(messages) = response.error_messages() {
        return Err(GraphQLError::Response(messages));
    }

    let introspection = response.data.unwrap_or(Value::Null);
    let schema = introspection
        .get("__schema")
        .cloned()
        .ok_or_else(|| GraphQLError::Introspection("missing `__schema` in response data".into()))
        .and_then(|schema| {
            serde_json::from_value::<IntrospectionSchema>(schema)
                .map_err(|e| GraphQLError::Introspection(e.to_string()))
        })?;
    debug!(
        endpoint = request.endpoint,
        types = schema.types.len(),
        "Received introspection result"
    );

    Ok(FetchedSchema {
        schema: schema.build()?,
        introspection,
    })
}
