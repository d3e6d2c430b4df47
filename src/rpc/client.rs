use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{DexError, Result};

/// Signs and broadcasts transactions built by the aggregator.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn wallet_address(&self) -> String;

    /// Takes a base58 serialized transaction and returns the submitted signature.
    async fn sign_and_send(&self, encoded_tx: &str) -> Result<String>;
}

/// Solana wallet backed by a local keypair and an RPC endpoint
pub struct SolanaWallet {
    keypair: Keypair,
    rpc: Arc<RpcClient>,
}

/// Restore a keypair from its base58 form (64 bytes).
pub fn keypair_from_base58(encoded: &str) -> Result<Keypair> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| DexError::WalletError(format!("Failed to decode base58 keypair: {}", e)))?;

    if bytes.len() != 64 {
        return Err(DexError::WalletError(format!(
            "Invalid keypair length: {}",
            bytes.len()
        )));
    }

    Keypair::from_bytes(&bytes)
        .map_err(|e| DexError::WalletError(format!("Failed to create keypair from bytes: {}", e)))
}

impl SolanaWallet {
    pub fn new(rpc_url: &str, private_key: &str) -> Result<Self> {
        rpc_url
            .parse::<url::Url>()
            .map_err(|_| DexError::ConfigError("Invalid RPC URL format".to_string()))?;

        let keypair = keypair_from_base58(private_key)?;
        let rpc = RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());

        debug!("Solana wallet {} using RPC {}", keypair.pubkey(), rpc_url);

        Ok(SolanaWallet {
            keypair,
            rpc: Arc::new(rpc),
        })
    }

    /// Wallet from `SOLANA_PRIVATE_KEY`, or `None` when it is not configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(private_key) = config.private_key.as_deref() else {
            return Ok(None);
        };

        let wallet = SolanaWallet::new(&config.rpc_url, private_key)?;
        if wallet.wallet_address() != config.wallet_address {
            warn!(
                "SOLANA_WALLET_ADDRESS {} does not match the signing key {}",
                config.wallet_address,
                wallet.wallet_address()
            );
        }
        Ok(Some(wallet))
    }
}

#[async_trait]
impl TransactionSigner for SolanaWallet {
    fn wallet_address(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    async fn sign_and_send(&self, encoded_tx: &str) -> Result<String> {
        let bytes = bs58::decode(encoded_tx)
            .into_vec()
            .map_err(|e| DexError::WalletError(format!("Failed to decode transaction: {}", e)))?;

        let transaction: VersionedTransaction = bincode::deserialize(&bytes)
            .map_err(|e| DexError::WalletError(format!("Failed to deserialize transaction: {}", e)))?;

        let mut message = transaction.message;
        let blockhash = self.rpc.get_latest_blockhash().await.map_err(|e| {
            error!("Failed to get latest blockhash: {}", e);
            DexError::NetworkError(format!("Failed to get latest blockhash: {}", e))
        })?;
        message.set_recent_blockhash(blockhash);

        let signed = VersionedTransaction::try_new(message, &[&self.keypair])
            .map_err(|e| DexError::WalletError(format!("Failed to sign transaction: {}", e)))?;

        info!("Sending swap transaction from {}", self.wallet_address());

        let signature = self
            .rpc
            .send_and_confirm_transaction(&signed)
            .await
            .map_err(|e| {
                error!("Failed to send transaction: {}", e);
                DexError::NetworkError(format!("Failed to send transaction: {}", e))
            })?;

        Ok(signature.to_string())
    }
}
