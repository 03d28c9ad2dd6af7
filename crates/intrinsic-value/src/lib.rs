//! Owner-earnings discounted cash flow valuation.
//!
//! Raw statement rows are mapped onto canonical fields by [`FieldExtractor`],
//! valued by [`ValuationEngine`] and compared with the market price by
//! [`VerdictClassifier`]. [`ValuationPipeline`] runs the three against a
//! [`valuation_core::FinancialDataProvider`].

pub mod engine;
pub mod extractor;
pub mod pipeline;
pub mod verdict;

pub use engine::{adjusted_cost, compute_ratios, project_cash_flows, terminal_value, total_debt, ValuationEngine};
pub use extractor::{apply_rule, Aggregation, FieldExtractor, FieldRule, LabelPattern, SignConvention, FIELD_RULES};
pub use pipeline::ValuationPipeline;
pub use verdict::VerdictClassifier;
