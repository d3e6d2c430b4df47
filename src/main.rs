use okx_dex_solana_mcp_server::server::JsonRpcRequest;
use okx_dex_solana_mcp_server::{Config, McpServer};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting OKX DEX Solana MCP Server...");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let mcp_server = Arc::new(McpServer::new(config.clone()));

    match mcp_server.initialize().await {
        Ok(_) => info!("MCP server initialized successfully"),
        Err(e) => {
            error!("Failed to initialize MCP server: {}", e);
            return Err(e.into());
        }
    }

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = TcpListener::bind(&addr).await?;

    info!("MCP server listening on {}", addr);
    info!("Available tool: okx_dex_tool (getQuote, getAllTokens, getLiquidity, getSupportedChains, executeSwap)");

    loop {
        let (socket, peer_addr) = listener.accept().await?;
        let mcp_server = Arc::clone(&mcp_server);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, peer_addr, mcp_server).await {
                error!("Error handling connection from {}: {}", peer_addr, e);
            }
        });
    }
}

async fn handle_connection(
    socket: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    mcp_server: Arc<McpServer>,
) -> eyre::Result<()> {
    let connection = peer_addr.to_string();
    let (reader, mut writer) = socket.into_split();
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();

    while buf_reader.read_line(&mut line).await? > 0 {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            line.clear();
            continue;
        }

        let response_json = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => {
                info!(
                    "Received request: {} (id: {:?})",
                    request.method, request.id
                );
                let response = mcp_server.handle_request(&connection, request).await;
                serde_json::to_string(&response)?
            }
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32700,
                        "message": "Parse error",
                        "data": e.to_string()
                    },
                    "id": null
                })
                .to_string()
            }
        };

        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        line.clear();
    }

    Ok(())
}
