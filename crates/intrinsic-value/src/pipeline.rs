use std::sync::Arc;

use valuation_core::{
    FinancialDataProvider, FinancialStatements, ValuationConfig, ValuationError, ValuationReport,
};

use crate::{FieldExtractor, ValuationEngine, VerdictClassifier};

/// Fetches, extracts, values and classifies one ticker per call.
///
/// Holds no per-request state, so one pipeline can serve concurrent
/// requests; each call fetches its own snapshot.
pub struct ValuationPipeline {
    provider: Arc<dyn FinancialDataProvider>,
    extractor: FieldExtractor,
    engine: ValuationEngine,
    config: ValuationConfig,
}

impl ValuationPipeline {
    pub fn new(provider: Arc<dyn FinancialDataProvider>, config: ValuationConfig) -> Result<Self, ValuationError> {
        config.validate()?;
        Ok(Self {
            provider,
            extractor: FieldExtractor::new(),
            engine: ValuationEngine::new(),
            config,
        })
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    pub async fn evaluate(&self, symbol: &str) -> Result<ValuationReport, ValuationError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValuationError::InvalidAssumption(
                "ticker symbol is empty".to_string(),
            ));
        }

        tracing::info!(
            symbol = %symbol,
            provider = self.provider.provider_name(),
            "Fetching financial statements"
        );
        let statements = self.provider.fetch(&symbol).await.map_err(|e| {
            tracing::warn!(symbol = %symbol, error = %e, "Provider fetch failed");
            ValuationError::from(e)
        })?;

        self.evaluate_statements(&statements)
    }

    /// Run everything after the fetch on an already retrieved snapshot.
    pub fn evaluate_statements(&self, statements: &FinancialStatements) -> Result<ValuationReport, ValuationError> {
        let symbol = statements.symbol.as_str();
        let financials = self.extractor.extract(statements)?;
        let result = self.engine.value(symbol, &financials, &self.config)?;

        let classifier = VerdictClassifier::new(self.config.verdict_band);
        let price = financials.current_price;
        let verdict = classifier.classify(result.per_share, price);
        let upside = VerdictClassifier::upside(result.per_share, price);
        let dividend_yield = match (financials.dividends_per_share, price) {
            (Some(dps), Some(price)) if price > 0.0 => Some(dps / price),
            _ => None,
        };

        tracing::info!(
            symbol,
            per_share = ?result.per_share,
            total_value = result.total_value,
            verdict = %verdict,
            "Valuation complete"
        );

        Ok(ValuationReport {
            symbol: symbol.to_string(),
            result,
            current_price: price,
            market_cap: financials.market_cap,
            dividend_yield,
            verdict,
            upside,
        })
    }
}
