use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::okx::{DexApi, OkxClient};
use crate::rpc::{SolanaWallet, TransactionSigner};
use crate::tools::{DexTool, TOOL_DESCRIPTION, TOOL_NAME};

/// JSON-RPC 2.0 Request format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Value,
}

/// JSON-RPC 2.0 Response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP Tool Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Arguments of a `tools/call` for the DEX tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallArguments {
    pub input: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// MCP Server exposing the OKX DEX tool
pub struct McpServer {
    config: Config,
    dex_tool: Arc<RwLock<Option<DexTool>>>,
}

impl McpServer {
    pub fn new(config: Config) -> Self {
        McpServer {
            config,
            dex_tool: Arc::new(RwLock::new(None)),
        }
    }

    /// Server with a ready tool, skipping `initialize`
    pub fn with_tool(config: Config, tool: DexTool) -> Self {
        McpServer {
            config,
            dex_tool: Arc::new(RwLock::new(Some(tool))),
        }
    }

    /// Initialize the server: load the wallet and build the OKX client
    pub async fn initialize(&self) -> crate::error::Result<()> {
        info!(
            "Initializing MCP server with OKX endpoint {} on chain {}",
            self.config.okx_base_url, self.config.chain_id
        );

        let signer = match SolanaWallet::from_config(&self.config)? {
            Some(wallet) => {
                info!("Swaps will be signed by {}", wallet.wallet_address());
                Some(Arc::new(wallet) as Arc<dyn TransactionSigner>)
            }
            None => {
                info!("SOLANA_PRIVATE_KEY not set; swap execution is disabled");
                None
            }
        };

        let client: Arc<dyn DexApi> = Arc::new(OkxClient::new(&self.config, signer)?);
        *self.dex_tool.write().await = Some(DexTool::new(client, &self.config));

        info!("MCP server initialized successfully");
        Ok(())
    }

    /// Get tool definitions (MCP spec)
    pub async fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "Either a JSON string {\"operation\": ..., \"params\": {...}} with operation one of getQuote, getAllTokens, getLiquidity, getSupportedChains, executeSwap, or a plain request such as 'quote for 1 sol to usdc' or 'confirm swap'"
                    },
                    "session_id": {
                        "type": "string",
                        "description": "Conversation identifier that owns pending quotes (defaults to one session per connection)"
                    }
                },
                "required": ["input"]
            }),
        }]
    }

    /// Handle a JSON-RPC request arriving on `connection`
    ///
    /// Tool calls without a `session_id` keep their pending quote per connection.
    pub async fn handle_request(
        &self,
        connection: &str,
        request: JsonRpcRequest,
    ) -> JsonRpcResponse {
        debug!(
            "Handling MCP request: {} with params: {:?}",
            request.method, request.params
        );

        let response = match request.method.as_str() {
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tool_call(connection, &request.params).await,
            "ping" => Ok(json!({"status": "ok"})),
            _ => Err(JsonRpcError {
                code: -32601,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        match response {
            Ok(result) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                result: Some(result),
                error: None,
                id: request.id,
            },
            Err(err) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                result: None,
                error: Some(err),
                id: request.id,
            },
        }
    }

    async fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        let tools = self.get_tool_definitions().await;
        serde_json::to_value(&tools).map_err(|e| JsonRpcError {
            code: -32603,
            message: format!("Internal error: {}", e),
            data: None,
        })
    }

    async fn handle_tool_call(
        &self,
        connection: &str,
        params: &Value,
    ) -> Result<Value, JsonRpcError> {
        let tool_name =
            params
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| JsonRpcError {
                    code: -32602,
                    message: "Missing or invalid 'name' parameter".to_string(),
                    data: None,
                })?;

        if tool_name != TOOL_NAME {
            return Err(JsonRpcError {
                code: -32601,
                message: format!("Tool not found: {}", tool_name),
                data: None,
            });
        }

        let arguments = params.get("arguments").ok_or_else(|| JsonRpcError {
            code: -32602,
            message: "Missing 'arguments' parameter".to_string(),
            data: None,
        })?;

        let arguments: ToolCallArguments =
            serde_json::from_value(arguments.clone()).map_err(|e| JsonRpcError {
                code: -32602,
                message: format!("Invalid arguments: {}", e),
                data: None,
            })?;

        let dex_tool = self.dex_tool.read().await;
        let tool = dex_tool.as_ref().ok_or_else(|| JsonRpcError {
            code: -32603,
            message: "DEX tool not initialized".to_string(),
            data: None,
        })?;

        let session_id = match arguments.session_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => connection_session_id(connection),
        };

        Ok(tool.handle(&session_id, &arguments.input).await.to_value())
    }
}

/// Session key for callers that do not name their conversation
pub fn connection_session_id(connection: &str) -> String {
    format!("connection:{}", connection)
}
