//! MCP (Model Context Protocol) transport
//!
//! Tools:
//! - `ask`: answer a question about the warehouse
//! - `catalog`: the catalog summary the LLM bridge is prompted with

use async_trait::async_trait;
use rust_mcp_schema::{
    schema_utils::CallToolError, CallToolRequest, CallToolResult, ContentBlock, Implementation,
    InitializeResult, ListToolsRequest, ListToolsResult, RpcError, ServerCapabilities,
    ServerCapabilitiesTools, TextContent, Tool, ToolInputSchema, LATEST_PROTOCOL_VERSION,
};
use rust_mcp_sdk::mcp_server::{hyper_server, HyperServerOptions, ServerHandler};
use rust_mcp_sdk::McpServer;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::engine::Engine;

pub struct NlqServerHandler {
    engine: Arc<Engine>,
}

impl NlqServerHandler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn server_info() -> InitializeResult {
        InitializeResult {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "nlq-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Olist question-to-SQL server".to_string()),
            },
            instructions: Some(
                "Answers questions about the Olist e-commerce warehouse. \
                 Use 'ask' with a question, or 'catalog' to see what can be asked about."
                    .to_string(),
            ),
            meta: None,
        }
    }

    fn tools() -> Vec<Tool> {
        let mut question_prop = Map::new();
        question_prop.insert("type".to_string(), Value::String("string".to_string()));
        question_prop.insert(
            "description".to_string(),
            Value::String("Question, e.g. 'Top 10 categories by sales'".to_string()),
        );
        let mut properties = HashMap::new();
        properties.insert("question".to_string(), question_prop);

        vec![
            Tool {
                name: "ask".to_string(),
                description: Some(
                    "Answer a question about orders, customers, products, payments, reviews \
                     and sellers. Returns the SQL that ran, result rows and a chart hint."
                        .to_string(),
                ),
                input_schema: ToolInputSchema::new(vec!["question".to_string()], Some(properties)),
                title: None,
                annotations: None,
                meta: None,
                output_schema: None,
            },
            Tool {
                name: "catalog".to_string(),
                description: Some(
                    "Describe the warehouse tables, columns and relationships.".to_string(),
                ),
                input_schema: ToolInputSchema::new(vec![], None),
                title: None,
                annotations: None,
                meta: None,
                output_schema: None,
            },
        ]
    }

    async fn handle_ask(&self, arguments: Option<Map<String, Value>>) -> CallToolResult {
        let question = arguments
            .as_ref()
            .and_then(|args| args.get("question"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let (envelope, is_error) = match self.engine.answer(question).await {
            Ok(response) => (response, None),
            Err(e) => (self.engine.failure(question, &e), Some(true)),
        };

        CallToolResult {
            content: vec![ContentBlock::TextContent(TextContent::new(
                serde_json::to_string_pretty(&envelope).unwrap_or_default(),
                None,
                None,
            ))],
            is_error,
            meta: None,
            structured_content: None,
        }
    }

    fn handle_catalog(&self) -> CallToolResult {
        CallToolResult {
            content: vec![ContentBlock::TextContent(TextContent::new(
                self.engine.catalog().summary(),
                None,
                None,
            ))],
            is_error: None,
            meta: None,
            structured_content: None,
        }
    }
}

#[async_trait]
impl ServerHandler for NlqServerHandler {
    async fn handle_list_tools_request(
        &self,
        _request: ListToolsRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            tools: Self::tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn handle_call_tool_request(
        &self,
        request: CallToolRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        info!(tool = %request.params.name, "Tool called");

        match request.params.name.as_str() {
            "ask" => Ok(self.handle_ask(request.params.arguments).await),
            "catalog" => Ok(self.handle_catalog()),
            _ => Err(CallToolError::unknown_tool(request.params.name.clone())),
        }
    }
}

/// Serve MCP over HTTP with SSE support
pub async fn serve(host: String, port: u16, engine: Arc<Engine>) -> anyhow::Result<()> {
    info!(%host, port, "nlq MCP server starting");

    let server = hyper_server::create_server(
        NlqServerHandler::server_info(),
        NlqServerHandler::new(engine),
        HyperServerOptions {
            host,
            port,
            sse_support: true,
            ..Default::default()
        },
    );

    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use nlq_catalog::SchemaCatalog;
    use nlq_duck::Warehouse;

    fn handler() -> NlqServerHandler {
        let catalog = Arc::new(SchemaCatalog::builtin().unwrap());
        let engine = Engine::new(
            catalog,
            Warehouse::new("/nonexistent/olist.duckdb"),
            EngineOptions::default(),
        )
        .unwrap();
        NlqServerHandler::new(Arc::new(engine))
    }

    fn text(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ContentBlock::TextContent(t) => t.text.as_str(),
            _ => panic!("expected text content"),
        }
    }

    #[test]
    fn test_tools_listed() {
        let names: Vec<_> = NlqServerHandler::tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["ask", "catalog"]);
    }

    #[tokio::test]
    async fn test_ask_without_question_is_error_result() {
        let result = handler().handle_ask(None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("invalid_question"));
    }

    #[test]
    fn test_catalog_tool_returns_summary() {
        let result = handler().handle_catalog();
        assert!(text(&result).contains("## Table: `orders`"));
    }
}
