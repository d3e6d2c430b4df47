use serde_json::{json, Value};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

type Reader = BufReader<OwnedReadHalf>;
type Writer = OwnedWriteHalf;

const TOOL_NAME: &str = "okx_dex_tool";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "chat".to_string());

    println!("╔═══════════════════════════════════════════════════════╗");
    println!("║   OKX DEX Solana MCP Server - Chat Client             ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    let addr = std::env::var("MCP_SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    println!("Connecting to server at {}...", addr);

    let socket = TcpStream::connect(&addr).await?;
    let (reader, writer) = socket.into_split();
    let reader = BufReader::new(reader);

    println!("✓ Connected successfully!\n");

    let session_id = format!("cli-{}", chrono::Utc::now().timestamp_millis());
    let mut client = ChatClient::new(reader, writer, session_id);

    match mode.as_str() {
        "swap" => client.run_swap_conversation().await,
        _ => client.run_chat().await,
    }
}

fn prompt(label: &str) -> eyre::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_or(label: &str, default: &str) -> eyre::Result<String> {
    let value = prompt(label)?;
    Ok(if value.is_empty() {
        default.to_string()
    } else {
        value
    })
}

struct ChatClient {
    reader: Reader,
    writer: Writer,
    request_id: i32,
    session_id: String,
}

impl ChatClient {
    fn new(reader: Reader, writer: Writer, session_id: String) -> Self {
        ChatClient {
            reader,
            writer,
            request_id: 1,
            session_id,
        }
    }

    async fn send_request(&mut self, request: Value) -> eyre::Result<Value> {
        let request_json = serde_json::to_string(&request)?;

        self.writer.write_all(request_json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut response_line = String::new();
        self.reader.read_line(&mut response_line).await?;
        self.request_id += 1;

        if response_line.is_empty() {
            eyre::bail!("server closed the connection");
        }

        let response: Value = serde_json::from_str(&response_line)?;
        if let Some(error) = response.get("error") {
            if !error.is_null() {
                println!(
                    "\n⚠️  Error: {}",
                    error.get("message").unwrap_or(&Value::Null)
                );
            }
        }
        Ok(response)
    }

    /// Sends one turn to the DEX tool and prints the envelope it returns.
    async fn ask(&mut self, input: &str) -> eyre::Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": TOOL_NAME,
                "arguments": {
                    "input": input,
                    "session_id": self.session_id
                }
            },
            "id": self.request_id
        });

        let response = self.send_request(request).await?;
        let envelope = response.get("result").cloned().unwrap_or(Value::Null);
        println!("\n← {}", serde_json::to_string_pretty(&envelope)?);
        println!("-------------------");
        Ok(envelope)
    }

    async fn list_tools(&mut self) -> eyre::Result<()> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tools/list",
            "params": {},
            "id": self.request_id
        });

        let response = self.send_request(request).await?;
        println!("{}", serde_json::to_string_pretty(&response["result"])?);
        Ok(())
    }

    async fn run_chat(&mut self) -> eyre::Result<()> {
        println!("Type a request, a JSON operation, 'tools' or 'exit'.");
        println!("  e.g. {{\"operation\":\"getAllTokens\"}}");
        println!("  e.g. quote for 0.001 sol to usdc, then: confirm swap\n");

        loop {
            let input = prompt("> ")?;
            match input.as_str() {
                "" => continue,
                "exit" | "quit" => {
                    println!("\nGoodbye!");
                    break;
                }
                "tools" => self.list_tools().await?,
                _ => {
                    self.ask(&input).await?;
                }
            }
        }

        Ok(())
    }

    /// Quote, ask the user, then confirm.
    async fn run_swap_conversation(&mut self) -> eyre::Result<()> {
        let amount = prompt_or("Amount to swap [0.001]: ", "0.001")?;
        let from_token = prompt_or("From token [SOL]: ", "SOL")?;
        let to_token = prompt_or("To token [USDC]: ", "USDC")?;

        println!("\nGetting quote...");
        let quote = self
            .ask(&format!(
                "Get me a quote for swapping {} {} to {}",
                amount, from_token, to_token
            ))
            .await?;

        if quote["status"] != "quote_ready" {
            println!("No quote available, nothing to confirm.");
            return Ok(());
        }

        let answer = prompt("Do you want to proceed with this swap? (yes/no): ")?.to_lowercase();
        if answer == "yes" || answer == "y" {
            println!("Executing swap...");
            self.ask("Confirm swap").await?;
        } else {
            println!("Swap cancelled by user.");
        }

        Ok(())
    }
}
