pub mod client;

pub use client::{SolanaWallet, TransactionSigner};
