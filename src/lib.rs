pub mod config;
pub mod error;
pub mod intent;
pub mod okx;
pub mod precision;
pub mod rpc;
pub mod server;
pub mod session;
pub mod tokens;
pub mod tools;

pub use config::Config;
pub use error::{DexError, Result};
pub use okx::{DexApi, OkxClient};
pub use rpc::{SolanaWallet, TransactionSigner};
pub use server::McpServer;
pub use tools::{DexTool, ResponseEnvelope};
