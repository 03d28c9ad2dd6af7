use async_trait::async_trait;

use crate::{FinancialStatements, ProviderError};

/// Source of financial statements and company facts for a ticker.
///
/// Implementations make a single attempt per call and report failures
/// as-is; callers decide what to do with them. Each call returns a fresh
/// snapshot that must not be shared between requests.
#[async_trait]
pub trait FinancialDataProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<FinancialStatements, ProviderError>;

    fn provider_name(&self) -> &'static str;
}

/// Serves one fixed snapshot regardless of the requested symbol.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    statements: FinancialStatements,
}

impl StaticProvider {
    pub fn new(statements: FinancialStatements) -> Self {
        Self { statements }
    }
}

#[async_trait]
impl FinancialDataProvider for StaticProvider {
    async fn fetch(&self, symbol: &str) -> Result<FinancialStatements, ProviderError> {
        let mut statements = self.statements.clone();
        statements.symbol = symbol.to_uppercase();
        Ok(statements)
    }

    fn provider_name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RawStatementRow, StatementTable};

    #[tokio::test]
    async fn test_static_provider_returns_independent_copies() {
        let provider = StaticProvider::new(FinancialStatements {
            symbol: String::new(),
            cash_flow: StatementTable::new(vec![RawStatementRow::with_values(
                "Capital Expenditure",
                &[-200.0],
            )]),
            ..Default::default()
        });

        let mut first = provider.fetch("aapl").await.unwrap();
        assert_eq!(first.symbol, "AAPL");
        first.cash_flow.rows.clear();

        let second = provider.fetch("msft").await.unwrap();
        assert_eq!(second.symbol, "MSFT");
        assert_eq!(second.cash_flow.len(), 1);
    }
}
