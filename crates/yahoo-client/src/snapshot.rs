use std::path::PathBuf;

use async_trait::async_trait;
use valuation_core::{FinancialDataProvider, FinancialStatements, ProviderError};

/// Serves statements recorded in a JSON file shaped like
/// [`FinancialStatements`]. The file is re-read on every call.
///
/// A snapshot with an empty `symbol` answers for any ticker; otherwise a
/// different ticker is reported as not found.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    path: PathBuf,
}

impl SnapshotProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FinancialDataProvider for SnapshotProvider {
    async fn fetch(&self, symbol: &str) -> Result<FinancialStatements, ProviderError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut statements: FinancialStatements = serde_json::from_str(&raw)?;

        if statements.symbol.is_empty() {
            statements.symbol = symbol.to_string();
        } else if !statements.symbol.eq_ignore_ascii_case(symbol) {
            tracing::warn!(
                requested = symbol,
                recorded = %statements.symbol,
                path = %self.path.display(),
                "Snapshot recorded for a different ticker"
            );
            return Err(ProviderError::TickerNotFound(symbol.to_string()));
        }
        statements.symbol = statements.symbol.to_uppercase();

        Ok(statements)
    }

    fn provider_name(&self) -> &'static str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_snapshot(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SNAPSHOT: &str = r#"{
        "symbol": "",
        "cash_flow": [{"label": "Capital Expenditures", "values": [-200.0, null]}],
        "balance_sheet": [{"label": "Total Stockholder Equity", "values": [5000.0]}],
        "income_statement": [{"label": "Net Income", "values": [1000.0]}],
        "facts": {"current_price": 42.5, "shares_outstanding": 100.0}
    }"#;

    #[tokio::test]
    async fn test_reads_snapshot_for_any_symbol() {
        let file = write_snapshot(SNAPSHOT);
        let provider = SnapshotProvider::new(file.path());

        let statements = provider.fetch("acme").await.unwrap();
        assert_eq!(statements.symbol, "ACME");
        assert_eq!(statements.cash_flow.len(), 1);
        assert_eq!(statements.cash_flow.rows[0].values, vec![Some(-200.0), None]);
        assert_eq!(statements.facts.current_price, Some(42.5));
        assert_eq!(statements.facts.market_cap, None);
    }

    #[tokio::test]
    async fn test_recorded_symbol_must_match() {
        let file = write_snapshot(&SNAPSHOT.replacen(r#""symbol": """#, r#""symbol": "acme""#, 1));
        let provider = SnapshotProvider::new(file.path());

        assert_eq!(provider.fetch("ACME").await.unwrap().symbol, "ACME");
        assert!(matches!(
            provider.fetch("MSFT").await,
            Err(ProviderError::TickerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_and_invalid_files() {
        let provider = SnapshotProvider::new("/nonexistent/snapshot.json");
        assert!(matches!(provider.fetch("ACME").await, Err(ProviderError::Transport(_))));

        let file = write_snapshot("{ not json");
        let provider = SnapshotProvider::new(file.path());
        assert!(matches!(provider.fetch("ACME").await, Err(ProviderError::Malformed(_))));
    }
}
