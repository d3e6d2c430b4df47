use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DexError, Result};
use crate::intent::{self, Intent, SwapPhrase};
use crate::okx::{DexApi, Quote, QuoteParams, SwapParams};
use crate::session::{PendingSession, SessionStore};
use crate::tokens::TokenRegistry;
use crate::tools::envelope::ResponseEnvelope;
use crate::tools::normalize::{self, QuoteResult};
use crate::tools::operation::{Operation, StructuredRequest, SwapRequest};

pub const TOOL_NAME: &str = "okx_dex_tool";
pub const TOOL_DESCRIPTION: &str = "Access OKX DEX for Solana operations like getting quotes, token information, and executing swaps.";

const QUOTE_READY_MESSAGE: &str =
    "Quote obtained. Reply with 'confirm swap' to execute this transaction.";

const DEFAULT_QUOTE_SLIPPAGE: &str = "0.001";
const NATURAL_QUOTE_SLIPPAGE: &str = "0.1";
const DEFAULT_SWAP_SLIPPAGE: &str = "0.5";
const DEFAULT_MAX_AUTO_SLIPPAGE_BPS: &str = "100";

/// Routes agent input to OKX DEX operations and gates swaps behind a prior quote.
pub struct DexTool {
    api: Arc<dyn DexApi>,
    tokens: TokenRegistry,
    sessions: SessionStore,
    chain_id: String,
    wallet_address: String,
}

impl DexTool {
    pub fn new(api: Arc<dyn DexApi>, config: &Config) -> Self {
        DexTool {
            api,
            tokens: TokenRegistry::new(),
            sessions: SessionStore::new(config.quote_ttl_secs),
            chain_id: config.chain_id.clone(),
            wallet_address: config.wallet_address.clone(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Entry point for one agent turn; always returns a serialized envelope.
    pub async fn call(&self, session_id: &str, input: &str) -> String {
        self.handle(session_id, input).await.to_json()
    }

    pub async fn handle(&self, session_id: &str, input: &str) -> ResponseEnvelope {
        let result = match StructuredRequest::parse(input) {
            Some(request) => self.process_operation(request).await,
            None => self.process_natural_language(session_id, input).await,
        };

        result.unwrap_or_else(|e| {
            warn!("Request failed for session {}: {}", session_id, e);
            ResponseEnvelope::from(e)
        })
    }

    async fn process_operation(&self, request: StructuredRequest) -> Result<ResponseEnvelope> {
        let operation = request.operation()?;
        info!("Structured operation: {}", operation);

        let params = request.params.as_ref();
        match operation {
            Operation::GetQuote => {
                let mut swap = SwapRequest::from_params(params);
                if swap.slippage.is_none() {
                    swap.slippage = Some(DEFAULT_QUOTE_SLIPPAGE.to_string());
                }
                self.handle_get_quote(&swap).await
            }
            Operation::GetAllTokens => self.handle_get_all_tokens().await,
            Operation::GetLiquidity => self.handle_get_liquidity().await,
            Operation::GetSupportedChains => self.handle_get_supported_chains().await,
            Operation::ExecuteSwap => {
                self.handle_execute_swap(&SwapRequest::from_params(params))
                    .await
            }
        }
    }

    async fn process_natural_language(
        &self,
        session_id: &str,
        input: &str,
    ) -> Result<ResponseEnvelope> {
        let intent = intent::parse(input);
        info!("Natural-language intent: {}", intent.name());

        match intent {
            Intent::ConfirmSwap => self.handle_confirm_swap(session_id).await,
            Intent::ListTokens => self.handle_get_all_tokens().await,
            Intent::ListLiquidity => self.handle_get_liquidity().await,
            Intent::ListChains => self.handle_get_supported_chains().await,
            Intent::ExecuteSwap(phrase) => {
                let mut swap = self.request_from_phrase(&phrase)?;
                swap.auto_slippage = Some(true);
                swap.max_auto_slippage_bps = Some(DEFAULT_MAX_AUTO_SLIPPAGE_BPS.to_string());
                self.handle_execute_swap(&swap).await
            }
            Intent::GetQuote(phrase) => {
                let mut swap = self.request_from_phrase(&phrase)?;
                swap.slippage = Some(NATURAL_QUOTE_SLIPPAGE.to_string());
                self.handle_quote_and_prepare(session_id, swap).await
            }
            Intent::Unrecognized => Err(DexError::Unrecognized),
        }
    }

    /// Resolves the token words and converts the amount using the from-token's decimals.
    fn request_from_phrase(&self, phrase: &SwapPhrase) -> Result<SwapRequest> {
        let (from, to) = self
            .tokens
            .resolve_pair(&phrase.from_token, &phrase.to_token)?;
        let amount = self.tokens.to_base_units(&phrase.amount, from.symbol)?;

        debug!(
            "{} {} -> {} resolved to {} base units",
            phrase.amount, from.symbol, to.symbol, amount
        );

        Ok(SwapRequest {
            from_token_address: from.address.to_string(),
            to_token_address: to.address.to_string(),
            amount,
            ..SwapRequest::default()
        })
    }

    async fn fetch_quote(
        &self,
        request: &SwapRequest,
        slippage: Option<String>,
    ) -> Result<(Quote, QuoteResult)> {
        let quote = self
            .api
            .get_quote(&QuoteParams {
                chain_id: self.chain_id.clone(),
                from_token_address: request.from_token_address.clone(),
                to_token_address: request.to_token_address.clone(),
                amount: request.amount.clone(),
                slippage,
            })
            .await?;
        let result = QuoteResult::from_quote(&quote.data)?;
        Ok((quote, result))
    }

    /// Stateless quote; never creates a pending session.
    async fn handle_get_quote(&self, request: &SwapRequest) -> Result<ResponseEnvelope> {
        request.validate()?;
        let (quote, result) = self.fetch_quote(request, request.slippage.clone()).await?;
        Ok(ResponseEnvelope::success(result.summary(), quote.raw))
    }

    async fn handle_quote_and_prepare(
        &self,
        session_id: &str,
        request: SwapRequest,
    ) -> Result<ResponseEnvelope> {
        request.validate()?;
        let (quote, result) = self.fetch_quote(&request, request.slippage.clone()).await?;
        let summary = result.summary();

        self.sessions
            .store(session_id, PendingSession::new(request, result))
            .await;

        Ok(ResponseEnvelope::quote_ready(
            QUOTE_READY_MESSAGE,
            summary,
            quote.raw,
        ))
    }

    /// Executes the stored quote's params. The quote is claimed up front and restored if the swap fails.
    async fn handle_confirm_swap(&self, session_id: &str) -> Result<ResponseEnvelope> {
        // 先取出报价，并发的第二次确认只会看到空会话
        let pending = self.sessions.take(session_id).await?;
        info!(
            "Confirming swap of {} {} for session {}",
            pending.result.from_amount, pending.result.from_token.symbol, session_id
        );

        match self.handle_execute_swap(&pending.params).await {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                self.sessions.restore(session_id, pending).await;
                Err(e)
            }
        }
    }

    /// Swaps immediately, independent of any pending quote.
    async fn handle_execute_swap(&self, request: &SwapRequest) -> Result<ResponseEnvelope> {
        request.validate()?;

        let auto_slippage = request.auto_slippage.unwrap_or(true);
        let slippage = request
            .slippage
            .clone()
            .unwrap_or_else(|| DEFAULT_SWAP_SLIPPAGE.to_string());
        let max_auto_slippage = request
            .max_auto_slippage_bps
            .clone()
            .unwrap_or_else(|| DEFAULT_MAX_AUTO_SLIPPAGE_BPS.to_string());

        // 报价仅用于结果展示
        let quote_slippage = (!auto_slippage).then(|| slippage.clone());
        let (_, result) = self.fetch_quote(request, quote_slippage).await?;

        let execution = self
            .api
            .execute_swap(&SwapParams {
                chain_id: self.chain_id.clone(),
                from_token_address: request.from_token_address.clone(),
                to_token_address: request.to_token_address.clone(),
                amount: request.amount.clone(),
                slippage,
                auto_slippage,
                max_auto_slippage,
                user_wallet_address: self.wallet_address.clone(),
            })
            .await?;

        info!(
            "Swap executed: {} {} -> {} {} (tx {})",
            result.from_amount,
            result.from_token.symbol,
            result.to_amount,
            result.to_token.symbol,
            execution.transaction_id
        );

        Ok(ResponseEnvelope::success(
            normalize::swap_summary(&result, &execution),
            execution.raw,
        ))
    }

    async fn handle_get_all_tokens(&self) -> Result<ResponseEnvelope> {
        let listing = self.api.get_tokens(&self.chain_id).await?;
        Ok(normalize::tokens_envelope(listing))
    }

    async fn handle_get_liquidity(&self) -> Result<ResponseEnvelope> {
        let listing = self.api.get_liquidity(&self.chain_id).await?;
        Ok(normalize::liquidity_envelope(listing))
    }

    async fn handle_get_supported_chains(&self) -> Result<ResponseEnvelope> {
        let listing = self.api.get_supported_chains(&self.chain_id).await?;
        Ok(normalize::chains_envelope(listing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okx::testing::MockDexApi;
    use crate::tools::envelope::Status;
    use futures::executor::block_on;
    use serde_json::{json, Value};

    const SOL: &str = "11111111111111111111111111111111";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn tool_with(api: Arc<MockDexApi>) -> DexTool {
        let config = Config::from_base_url("https://www.okx.com".to_string());
        DexTool::new(api, &config)
    }

    #[test]
    fn test_get_all_tokens_end_to_end() {
        let api = Arc::new(MockDexApi::with_tokens(14));
        let tool = tool_with(api.clone());

        let output = block_on(tool.call("s1", r#"{"operation":"getAllTokens"}"#));
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["status"], "success");
        assert!(value["summary"].as_str().unwrap().contains("14"));
        assert_eq!(value["tokens"].as_array().unwrap().len(), 10);
        assert_eq!(value["data"]["data"].as_array().unwrap().len(), 14);
        assert_eq!(api.calls(), vec!["get_tokens"]);
    }

    #[test]
    fn test_missing_operation_makes_no_upstream_call() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let envelope = block_on(tool.handle("s1", r#"{"params":{"amount":"1"}}"#));
        assert!(envelope.is_error());
        assert_eq!(
            envelope.message.unwrap(),
            "Missing operation parameter. Available operations: getQuote, getAllTokens, getLiquidity, getSupportedChains, executeSwap."
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_unknown_operation() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let envelope = block_on(tool.handle("s1", r#"{"operation":"getBalance"}"#));
        assert!(envelope
            .message
            .unwrap()
            .starts_with("Unknown operation: getBalance."));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_missing_params_short_circuit() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        for input in [
            r#"{"operation":"getQuote","params":{"fromTokenAddress":"x"}}"#,
            r#"{"operation":"executeSwap"}"#,
        ] {
            let envelope = block_on(tool.handle("s1", input));
            assert!(envelope.is_error());
            assert!(envelope
                .message
                .unwrap()
                .starts_with("Required parameters missing"));
        }
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_structured_quote_is_stateless() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let input = json!({
            "operation": "getQuote",
            "params": {"fromTokenAddress": SOL, "toTokenAddress": USDC, "amount": "1000000000"}
        })
        .to_string();
        let envelope = block_on(tool.handle("s1", &input));

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.summary.unwrap()["fromToken"], "SOL");
        assert_eq!(
            api.quotes.lock().unwrap()[0].slippage.as_deref(),
            Some("0.001")
        );
        assert!(block_on(tool.sessions().is_empty()));
    }

    #[test]
    fn test_quote_then_confirm_flow() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let quote = block_on(tool.handle("s1", "Get me a quote for swapping 0.001 SOL to USDC"));
        assert_eq!(quote.status, Status::QuoteReady);
        assert!(quote.message.unwrap().contains("confirm swap"));
        assert_eq!(api.calls(), vec!["get_quote"]);

        {
            let quotes = api.quotes.lock().unwrap();
            assert_eq!(quotes[0].amount, "1000000");
            assert_eq!(quotes[0].from_token_address, SOL);
            assert_eq!(quotes[0].to_token_address, USDC);
            assert_eq!(quotes[0].slippage.as_deref(), Some("0.1"));
        }

        let pending = block_on(tool.sessions().pending("s1")).unwrap();
        assert_eq!(pending.params.amount, "1000000");

        let confirmed = block_on(tool.handle("s1", "Confirm swap"));
        assert_eq!(confirmed.status, Status::Success);
        assert_eq!(confirmed.summary.unwrap()["txId"], "5sigMockTx");
        assert_eq!(api.calls(), vec!["get_quote", "get_quote", "execute_swap"]);

        let swaps = api.swaps.lock().unwrap();
        assert_eq!(swaps[0].amount, "1000000");
        assert_eq!(swaps[0].slippage, "0.1");
        assert!(swaps[0].auto_slippage);
        assert_eq!(swaps[0].max_auto_slippage, "100");
        assert_eq!(
            swaps[0].user_wallet_address,
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn test_confirm_clears_pending_quote() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        block_on(tool.handle("s1", "quote for 1 sol to usdc"));
        block_on(tool.handle("s1", "confirm swap"));

        let again = block_on(tool.handle("s1", "confirm swap"));
        assert_eq!(
            again.message.unwrap(),
            "No quote has been prepared. Please get a quote first."
        );
    }

    #[test]
    fn test_confirm_without_quote_makes_no_upstream_call() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let envelope = block_on(tool.handle("s1", "Confirm swap"));
        assert!(envelope.is_error());
        assert_eq!(
            envelope.message.unwrap(),
            "No quote has been prepared. Please get a quote first."
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_quote_is_scoped_to_its_session() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        block_on(tool.handle("alice", "quote for 1 sol to usdc"));
        let bob = block_on(tool.handle("bob", "confirm swap"));

        assert!(bob.is_error());
        assert!(!api.calls().contains(&"execute_swap"));
    }

    #[test]
    fn test_natural_language_execute_bypasses_gate() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let envelope = block_on(tool.handle("s1", "swap 2 usdc to sol"));
        assert_eq!(envelope.status, Status::Success);
        assert_eq!(api.calls(), vec!["get_quote", "execute_swap"]);

        // 自动滑点时报价请求不带 slippage
        assert!(api.quotes.lock().unwrap()[0].slippage.is_none());
        let swaps = api.swaps.lock().unwrap();
        assert_eq!(swaps[0].amount, "2000000");
        assert_eq!(swaps[0].from_token_address, USDC);
        assert_eq!(swaps[0].slippage, "0.5");
        assert!(block_on(tool.sessions().is_empty()));
    }

    #[test]
    fn test_structured_execute_with_fixed_slippage() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let input = json!({
            "operation": "executeSwap",
            "params": {
                "fromTokenAddress": SOL,
                "toTokenAddress": USDC,
                "amount": "10000000",
                "slippage": "0.1",
                "autoSlippage": false
            }
        })
        .to_string();
        let envelope = block_on(tool.handle("s1", &input));

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(
            api.quotes.lock().unwrap()[0].slippage.as_deref(),
            Some("0.1")
        );
        let swaps = api.swaps.lock().unwrap();
        assert!(!swaps[0].auto_slippage);
        assert_eq!(swaps[0].slippage, "0.1");
    }

    #[test]
    fn test_unknown_token_word() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let envelope = block_on(tool.handle("s1", "quote for 5 bonk to usdc"));
        let message = envelope.message.unwrap();
        assert!(message.contains("bonk"));
        assert!(message.contains("Available tokens: sol, usdc"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_unrecognized_input() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let envelope = block_on(tool.handle("s1", "what's the weather"));
        assert!(envelope
            .message
            .unwrap()
            .starts_with("I couldn't understand your request."));
    }

    #[test]
    fn test_upstream_failure_never_escapes() {
        let quote_params = json!({
            "fromTokenAddress": SOL, "toTokenAddress": USDC, "amount": "1000000"
        });
        let inputs = vec![
            json!({"operation": "getQuote", "params": quote_params}).to_string(),
            json!({"operation": "executeSwap", "params": quote_params}).to_string(),
            json!({"operation": "getAllTokens"}).to_string(),
            json!({"operation": "getLiquidity"}).to_string(),
            json!({"operation": "getSupportedChains"}).to_string(),
            "quote for 1 sol to usdc".to_string(),
        ];

        let api = Arc::new(MockDexApi::failing());
        let tool = tool_with(api.clone());
        for input in &inputs {
            let output = block_on(tool.call("s1", input));
            let value: Value = serde_json::from_str(&output).unwrap();
            assert_eq!(value["status"], "error", "input: {}", input);
            assert_eq!(value["message"], "simulated network failure");
            assert_eq!(value["details"]["code"], "50001");
        }

        // 报价失败不会留下待确认的报价
        assert!(block_on(tool.sessions().is_empty()));
    }

    #[test]
    fn test_failed_swap_keeps_quote_for_retry() {
        let api = Arc::new(MockDexApi::rejecting_swaps());
        let tool = tool_with(api.clone());

        let quote = block_on(tool.handle("s1", "quote for 1 sol to usdc"));
        assert_eq!(quote.status, Status::QuoteReady);

        let envelope = block_on(tool.handle("s1", "confirm swap"));
        assert_eq!(envelope.status, Status::Error);
        assert_eq!(envelope.message.as_deref(), Some("swap rejected"));
        assert_eq!(envelope.details, Some(json!({"code": "82000"})));

        let pending = block_on(tool.sessions().pending("s1")).unwrap();
        assert_eq!(pending.params.amount, "1000000000");
        assert_eq!(api.calls(), vec!["get_quote", "get_quote", "execute_swap"]);
    }

    #[test]
    fn test_structured_swap_submission_failure() {
        let api = Arc::new(MockDexApi::rejecting_swaps());
        let tool = tool_with(api.clone());

        let input = json!({
            "operation": "executeSwap",
            "params": {"fromTokenAddress": SOL, "toTokenAddress": USDC, "amount": "1000000"}
        })
        .to_string();
        let value: Value = serde_json::from_str(&block_on(tool.call("s1", &input))).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "swap rejected");
        assert_eq!(api.calls(), vec!["get_quote", "execute_swap"]);
    }

    #[test]
    fn test_fractional_base_units_rejected_before_upstream() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        for operation in ["getQuote", "executeSwap"] {
            let input = json!({
                "operation": operation,
                "params": {"fromTokenAddress": SOL, "toTokenAddress": USDC, "amount": "1.5"}
            })
            .to_string();
            let envelope = block_on(tool.handle("s1", &input));
            assert_eq!(envelope.status, Status::Error);
            assert!(envelope.message.unwrap().starts_with("Invalid amount"));
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_confirms_swap_once() {
        let api = Arc::new(MockDexApi::yielding());
        let tool = tool_with(api.clone());

        let quote = tool.handle("s1", "quote for 1 sol to usdc").await;
        assert_eq!(quote.status, Status::QuoteReady);

        let (a, b) = tokio::join!(
            tool.handle("s1", "confirm swap"),
            tool.handle("s1", "confirm swap")
        );

        let statuses = [a.status, b.status];
        assert!(statuses.contains(&Status::Success));
        assert!(statuses.contains(&Status::Error));
        assert_eq!(api.swaps.lock().unwrap().len(), 1);
        assert!(tool.sessions().is_empty().await);
    }

    #[test]
    fn test_listing_intents_route_to_listings() {
        let api = Arc::new(MockDexApi::new());
        let tool = tool_with(api.clone());

        let liquidity = block_on(tool.handle("s1", "Which liquidity sources do you use?"));
        assert!(liquidity
            .summary
            .unwrap()
            .as_str()
            .unwrap()
            .contains("Raydium, Orca"));

        let chains = block_on(tool.handle("s1", "supported chains please"));
        assert_eq!(chains.data.unwrap()[0]["nativeCurrency"], "SOL");

        assert_eq!(api.calls(), vec!["get_liquidity", "get_supported_chains"]);
    }
}
