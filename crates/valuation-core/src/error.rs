use thiserror::Error;

/// Failures raised by a financial data provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    #[error("{statement} unavailable for {symbol}")]
    StatementUnavailable { symbol: String, statement: String },

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Malformed(err.to_string())
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// Reasons a valuation request can fail. Every variant is fatal for the
/// request; no partial result is produced.
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Could not fetch required financial data: {0}")]
    DataUnavailable(String),

    #[error("Missing required financial components: {}", .0.join(", "))]
    MissingComponents(Vec<String>),

    #[error(
        "Terminal value undefined: discount rate {discount_rate} must exceed growth rate {growth_rate}"
    )]
    UndefinedTerminalValue { discount_rate: f64, growth_rate: f64 },

    #[error("Invalid assumption: {0}")]
    InvalidAssumption(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<ProviderError> for ValuationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::TickerNotFound(_) | ProviderError::StatementUnavailable { .. } => {
                ValuationError::DataUnavailable(err.to_string())
            }
            ProviderError::Malformed(_) | ProviderError::Transport(_) => {
                ValuationError::Unexpected(err.to_string())
            }
        }
    }
}
