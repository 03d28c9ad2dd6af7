use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use valuation_core::{FinancialDataProvider, FinancialStatements, ProviderError};

use crate::parse::parse_quote_summary;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const MODULES: &str = "cashflowStatementHistory,balanceSheetHistory,incomeStatementHistory,price,financialData,defaultKeyStatistics,summaryDetail";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Statements and company facts from the Yahoo Finance quote-summary
/// endpoint. One request per `fetch`, no retry.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Reads `YAHOO_BASE_URL` and `YAHOO_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("YAHOO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("YAHOO_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn quote_summary_url(&self, symbol: &str) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url, symbol, MODULES
        )
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::from_env()
    }
}

#[async_trait]
impl FinancialDataProvider for YahooFinanceClient {
    async fn fetch(&self, symbol: &str) -> Result<FinancialStatements, ProviderError> {
        let url = self.quote_summary_url(symbol);
        tracing::debug!(symbol, url = %url, "Requesting quote summary");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::TickerNotFound(symbol.to_string()));
        }
        if !status.is_success() {
            tracing::warn!(symbol, status = status.as_u16(), "Quote summary request failed");
            return Err(ProviderError::Transport(format!(
                "Yahoo Finance returned HTTP {status} for {symbol}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let json: serde_json::Value = serde_json::from_str(&body)?;

        parse_quote_summary(symbol, &json)
    }

    fn provider_name(&self) -> &'static str {
        "yahoo"
    }
}
