//! Financial statement providers for the valuation pipeline: the Yahoo
//! Finance quote-summary client and an offline JSON snapshot reader.

pub mod client;
pub mod parse;
pub mod snapshot;

pub use client::{YahooFinanceClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use parse::{camel_to_label, parse_quote_summary};
pub use snapshot::SnapshotProvider;
