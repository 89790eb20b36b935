//! The MCP server exposing the GraphQL tools

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::stdio;
use rmcp::{RoleServer, ServerHandler, ServiceExt as _};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::errors::{McpError, ServerError};
use crate::tools::dispatch::dispatch;
use crate::tools::{GraphQLIntrospect, GraphQLQuery};

/// Name reported to MCP clients
pub const SERVER_NAME: &str = "graphql-mcp-server";

/// The MCP service handling tool calls for a single session
#[derive(Clone)]
pub struct GraphQLServer {
    config: Arc<Config>,
    query_tool: GraphQLQuery,
    introspect_tool: GraphQLIntrospect,
}

impl GraphQLServer {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            query_tool: GraphQLQuery::new(config.clone()),
            introspect_tool: GraphQLIntrospect::new(config.clone()),
            config,
        }
    }

    /// Every tool this server exposes
    pub fn tools(&self) -> Vec<Tool> {
        vec![self.query_tool.tool.clone(), self.introspect_tool.tool.clone()]
    }

    /// Handle a tool call by name
    pub async fn call(&self, request: CallToolRequestParam) -> CallToolResult {
        debug!(tool = %request.name, "Handling tool call");
        dispatch(
            &self.query_tool,
            &self.introspect_tool,
            &request.name,
            request.arguments,
        )
        .await
    }
}

impl ServerHandler for GraphQLServer {
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call(request).await)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.tools(),
        })
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: self.config.version.clone(),
            },
            ..Default::default()
        }
    }
}

/// A GraphQL MCP server speaking over stdio
pub struct Server {
    config: Arc<Config>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Serve a single stdio session until the client disconnects
    pub async fn start(self) -> Result<(), ServerError> {
        info!("Starting MCP server in stdio mode");
        let service = GraphQLServer::new(self.config)
            .serve(stdio())
            .await
            .inspect_err(|e| {
                error!("serving error: {:?}", e);
            })
            .map_err(|e| ServerError::Transport(e.to_string()))?;
        service.waiting().await.map_err(ServerError::StartupError)?;
        info!("MCP session ended");
        Ok(())
    }
}
