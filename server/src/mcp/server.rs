//! MCP Server Implementation
//!
//! Handles MCP protocol requests and routes tool calls to the document index,
//! the agent memory and the numeric helpers.

use super::protocol::*;
use super::tools::{self, get_all_tools};
use super::transport::{Incoming, LineTransport, StdioTransport};
use crate::error::{ServerError, ServerResult};
use crate::memory::MemoryManager;
use crate::numeric::{exponential_sum, int_list_from_value};
use recall_memory::{
    DocumentIndexer, IndexConfig, IngestReport, MemoryKind, MemoryRecord, RetrieveOptions,
    SearchResult, VectorEngine,
};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "recall";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Static configuration for the MCP backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub index: IndexConfig,
    /// Results returned by `search_documents`
    pub top_k: usize,
}

/// MCP Backend - document index plus agent memory
pub struct McpBackend {
    pub documents: Arc<DocumentIndexer>,
    pub memory_manager: Arc<MemoryManager>,
    engine: Arc<VectorEngine>,
    top_k: usize,
}

impl McpBackend {
    /// Load the persisted document index; agent memory opens on `initialize`
    pub fn new(engine: Arc<VectorEngine>, config: BackendConfig) -> ServerResult<Self> {
        let documents = DocumentIndexer::open(Arc::clone(&engine), config.index)?;
        tracing::info!(
            "Document index loaded from {:?} ({} chunks)",
            documents.config().storage_dir,
            documents.memory().len()
        );

        Ok(Self {
            documents: Arc::new(documents),
            memory_manager: Arc::new(MemoryManager::new()),
            engine,
            top_k: config.top_k,
        })
    }

    /// Run one ingestion pass over the source directory
    pub async fn index_documents(&self) -> ServerResult<IngestReport> {
        tracing::info!(
            "Indexing documents in {:?}",
            self.documents.config().source_dir
        );
        let report = self.documents.ingest().await?;
        for failed in &report.failed {
            tracing::warn!("Skipped {}: {}", failed.name, failed.error);
        }
        Ok(report)
    }

    /// Open the agent memory next to the document index
    pub async fn initialize_memory(&self) -> ServerResult<PathBuf> {
        let storage_dir = self.documents.config().storage_dir.clone();
        self.memory_manager
            .initialize(&storage_dir, Arc::clone(&self.engine))
            .await
    }

    /// Formatted chunks nearest to `query`, re-indexing first if sources changed
    pub async fn search_documents(&self, query: &str) -> ServerResult<Vec<String>> {
        if let Some(report) = self.documents.refresh_if_stale().await? {
            tracing::info!(
                "Re-indexed {} documents before search",
                report.processed
            );
        }

        let options = RetrieveOptions::new(self.top_k);
        let results = self.documents.memory().retrieve(query, &options).await?;

        Ok(results
            .into_iter()
            .map(|record| {
                format!(
                    "{}\n [Source: {}, ID: {}]",
                    record.text,
                    record.source_name.as_deref().unwrap_or("unknown"),
                    record.chunk_id.as_deref().unwrap_or("unknown")
                )
            })
            .collect())
    }
}

/// MCP Server - handles protocol messages
pub struct McpServer {
    backend: McpBackend,
    initialized: bool,
}

impl McpServer {
    pub fn new(backend: McpBackend) -> Self {
        Self {
            backend,
            initialized: false,
        }
    }

    pub fn backend(&self) -> &McpBackend {
        &self.backend
    }

    /// Run the MCP server event loop on stdio
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Answer requests until the client closes its end
    pub async fn serve<R, W>(&mut self, transport: &mut LineTransport<R, W>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!("MCP server starting...");

        while let Some(message) = transport.read_message().await? {
            let response = match message {
                Incoming::Request(request) => self.handle_request(request).await,
                Incoming::Malformed(reason) => Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Parse error: {}", reason)),
                )),
            };
            if let Some(response) = response {
                transport.write_response(&response).await?;
            }
        }

        tracing::info!("Client disconnected");
        Ok(())
    }

    /// Handle a JSON-RPC message; notifications get no response
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Handling request: {}", request.method);

        let notification = request.is_notification();
        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params).await,
            "initialized" | "notifications/initialized" | "notifications/cancelled" => {
                JsonRpcResponse::success(id, Value::Null)
            }
            "ping" => respond(id, &PingResult {}),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(id, JsonRpcError::method_not_found(&request.method)),
        };

        (!notification).then_some(response)
    }

    async fn handle_initialize(
        &mut self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();
        if let Some(client) = &params.client_info {
            tracing::info!("Client: {} {:?}", client.name, client.version);
        }

        if !self.initialized {
            match self.backend.index_documents().await {
                Ok(report) => tracing::info!(
                    "Indexed {} documents ({} unchanged, {} failed)",
                    report.processed,
                    report.skipped,
                    report.failed.len()
                ),
                Err(e) => tracing::error!("Document indexing failed: {}", e),
            }
            if let Err(e) = self.backend.initialize_memory().await {
                tracing::warn!("Failed to initialize memory manager: {}", e);
            }
            self.initialized = true;
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                experimental: None,
                logging: Some(LoggingCapability {}),
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(SERVER_VERSION.to_string()),
            },
        };

        respond(id, &result)
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        respond(
            id,
            &ToolsListResult {
                tools: get_all_tools(),
            },
        )
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                );
            }
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        let tool_result = match self.execute_tool(&params.name, params.arguments).await {
            Ok(result) => ToolCallResult {
                content: into_content(result),
                is_error: None,
            },
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", params.name, e);
                ToolCallResult {
                    content: vec![ToolResultContent::text(format!("Error: {}", e))],
                    is_error: Some(true),
                }
            }
        };
        respond(id, &tool_result)
    }

    /// Execute a tool by name
    async fn execute_tool(&self, name: &str, args: Option<Value>) -> ServerResult<Value> {
        let args = args.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            tools::SEARCH_DOCUMENTS => {
                let query = required_str(&args, "query")?;
                let results = self.backend.search_documents(query).await?;
                Ok(serde_json::to_value(results)?)
            }

            tools::MEMORY_ADD => {
                let mut builder = MemoryRecord::builder()
                    .text(required_str(&args, "text")?)
                    .kind(optional_kind(&args)?.unwrap_or_default())
                    .tags(optional_tags(&args)?);
                if let Some(session) = optional_str(&args, "session_id") {
                    builder = builder.group_id(session);
                }
                if let Some(tool_name) = optional_str(&args, "tool_name") {
                    builder = builder.source_name(tool_name);
                }
                if let Some(user_query) = optional_str(&args, "user_query") {
                    builder = builder.origin_query(user_query);
                }

                let stored = self.backend.memory_manager.add(builder.build()?).await?;
                Ok(serde_json::json!({
                    "stored": true,
                    "position": stored.position,
                    "persisted": stored.persisted,
                }))
            }

            tools::MEMORY_SEARCH => {
                let query = required_str(&args, "query")?;
                let mut options = RetrieveOptions::new(optional_usize(&args, "top_k")?.unwrap_or(3))
                    .tags(optional_tags(&args)?);
                if let Some(kind) = optional_kind(&args)? {
                    options = options.kind(kind);
                }
                if let Some(session) = optional_str(&args, "session_id") {
                    options = options.group(session);
                }

                let results = self.backend.memory_manager.search(query, &options).await?;
                let results_json: Vec<Value> = results.iter().map(search_result_json).collect();
                Ok(serde_json::json!({
                    "results": results_json,
                    "total": results.len()
                }))
            }

            tools::MEMORY_STATS => {
                let memory = match self.backend.memory_manager.stats().await {
                    Ok(stats) => stats,
                    Err(ServerError::NotInitialized) => Value::Null,
                    Err(e) => return Err(e),
                };
                Ok(serde_json::json!({
                    "memory": memory,
                    "documents": self.backend.documents.memory().stats(),
                }))
            }

            tools::INT_LIST_TO_EXPONENTIAL_SUM => {
                let value = args
                    .get("int_list")
                    .ok_or_else(|| ServerError::invalid_params("Missing 'int_list' parameter"))?;
                let values = int_list_from_value(value)?;
                Ok(serde_json::json!(exponential_sum(&values)?))
            }

            _ => Err(ServerError::UnknownTool(name.to_string())),
        }
    }
}

fn respond<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}

/// One text item per string in a string array; pretty JSON otherwise
fn into_content(result: Value) -> Vec<ToolResultContent> {
    match result {
        Value::String(text) => vec![ToolResultContent::text(text)],
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(ToolResultContent::text(text)),
                _ => None,
            })
            .collect(),
        other => vec![ToolResultContent::text(
            serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
        )],
    }
}

fn search_result_json(result: &SearchResult) -> Value {
    let record = &result.record;
    serde_json::json!({
        "text": record.text,
        "kind": record.kind,
        "created_at": record.created_at.to_rfc3339(),
        "tags": record.tags,
        "session_id": record.group_id,
        "tool_name": record.source_name,
        "user_query": record.origin_query,
        "distance": result.distance,
    })
}

fn required_str<'a>(args: &'a Value, key: &str) -> ServerResult<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ServerError::invalid_params(format!("Missing '{}' parameter", key)))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn optional_usize(args: &Value, key: &str) -> ServerResult<Option<usize>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(|n| Some(n as usize)).ok_or_else(|| {
            ServerError::invalid_params(format!("'{}' must be a non-negative integer", key))
        }),
    }
}

fn optional_kind(args: &Value) -> ServerResult<Option<MemoryKind>> {
    match optional_str(args, "kind") {
        None => Ok(None),
        Some(kind) => kind
            .parse::<MemoryKind>()
            .map(Some)
            .map_err(|e| ServerError::invalid_params(e.to_string())),
    }
}

fn optional_tags(args: &Value) -> ServerResult<Vec<String>> {
    match args.get("tags") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ServerError::invalid_params("'tags' must be strings"))
            })
            .collect(),
        Some(_) => Err(ServerError::invalid_params("'tags' must be an array of strings")),
    }
}
