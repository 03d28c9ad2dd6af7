use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValuationConfig;

/// The three statements a provider returns for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    CashFlow,
    BalanceSheet,
    IncomeStatement,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::CashFlow,
        StatementKind::BalanceSheet,
        StatementKind::IncomeStatement,
    ];

    pub fn to_label(&self) -> &'static str {
        match self {
            StatementKind::CashFlow => "Cash flow statement",
            StatementKind::BalanceSheet => "Balance sheet",
            StatementKind::IncomeStatement => "Income statement",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// One labelled line of a financial statement. `values[0]` is the most
/// recent reporting period; `None` marks a period the provider left blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatementRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl RawStatementRow {
    pub fn new(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// Row whose every period is reported.
    pub fn with_values(label: impl Into<String>, values: &[f64]) -> Self {
        Self::new(label, values.iter().copied().map(Some).collect())
    }

    /// Most recent reported value, skipping blank and NaN periods.
    pub fn latest(&self) -> Option<f64> {
        self.values
            .iter()
            .flatten()
            .copied()
            .find(|v| v.is_finite())
    }
}

/// Ordered rows of a single statement, as supplied by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementTable {
    pub rows: Vec<RawStatementRow>,
}

impl StatementTable {
    pub fn new(rows: Vec<RawStatementRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawStatementRow> {
        self.rows.iter()
    }
}

impl FromIterator<RawStatementRow> for StatementTable {
    fn from_iter<I: IntoIterator<Item = RawStatementRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Scalar company facts reported next to the statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFacts {
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Annual dividend per share.
    #[serde(default)]
    pub dividend_rate: Option<f64>,
}

/// Everything a provider returns for one ticker request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub cash_flow: StatementTable,
    #[serde(default)]
    pub balance_sheet: StatementTable,
    #[serde(default)]
    pub income_statement: StatementTable,
    #[serde(default)]
    pub facts: CompanyFacts,
}

impl FinancialStatements {
    pub fn statement(&self, kind: StatementKind) -> &StatementTable {
        match kind {
            StatementKind::CashFlow => &self.cash_flow,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::IncomeStatement => &self.income_statement,
        }
    }
}

/// Canonical inputs of the valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    NetIncome,
    OperatingCashFlow,
    CapitalExpenditures,
    DepreciationAmortization,
    DividendsPaid,
    ShareholderEquity,
    LongTermDebt,
    ShortTermDebt,
    CashAndEquivalents,
    CapitalLeases,
    MinorityInterest,
    PreferredStock,
    TreasuryStock,
    SharesOutstanding,
    CurrentPrice,
    MarketCap,
    DividendsPerShare,
}

impl CanonicalField {
    pub fn to_label(&self) -> &'static str {
        match self {
            CanonicalField::NetIncome => "Net Income",
            CanonicalField::OperatingCashFlow => "Operating Cash Flow",
            CanonicalField::CapitalExpenditures => "Capital Expenditures",
            CanonicalField::DepreciationAmortization => "Depreciation & Amortization",
            CanonicalField::DividendsPaid => "Dividends Paid",
            CanonicalField::ShareholderEquity => "Shareholder Equity",
            CanonicalField::LongTermDebt => "Long-Term Debt",
            CanonicalField::ShortTermDebt => "Short-Term Debt",
            CanonicalField::CashAndEquivalents => "Cash & Equivalents",
            CanonicalField::CapitalLeases => "Capital Leases",
            CanonicalField::MinorityInterest => "Minority Interest",
            CanonicalField::PreferredStock => "Preferred Stock",
            CanonicalField::TreasuryStock => "Treasury Stock",
            CanonicalField::SharesOutstanding => "Shares Outstanding",
            CanonicalField::CurrentPrice => "Current Price",
            CanonicalField::MarketCap => "Market Cap",
            CanonicalField::DividendsPerShare => "Dividends Per Share",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Snapshot extracted from one provider response. `None` means the field
/// was not found, which is distinct from a reported zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFinancials {
    pub net_income: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditures: Option<f64>,
    pub depreciation_amortization: Option<f64>,
    pub dividends_paid: Option<f64>,
    pub shareholder_equity: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub short_term_debt: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub capital_leases: Option<f64>,
    pub minority_interest: Option<f64>,
    pub preferred_stock: Option<f64>,
    pub treasury_stock: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub dividends_per_share: Option<f64>,
}

impl CanonicalFinancials {
    pub fn get(&self, field: CanonicalField) -> Option<f64> {
        match field {
            CanonicalField::NetIncome => self.net_income,
            CanonicalField::OperatingCashFlow => self.operating_cash_flow,
            CanonicalField::CapitalExpenditures => self.capital_expenditures,
            CanonicalField::DepreciationAmortization => self.depreciation_amortization,
            CanonicalField::DividendsPaid => self.dividends_paid,
            CanonicalField::ShareholderEquity => self.shareholder_equity,
            CanonicalField::LongTermDebt => self.long_term_debt,
            CanonicalField::ShortTermDebt => self.short_term_debt,
            CanonicalField::CashAndEquivalents => self.cash_and_equivalents,
            CanonicalField::CapitalLeases => self.capital_leases,
            CanonicalField::MinorityInterest => self.minority_interest,
            CanonicalField::PreferredStock => self.preferred_stock,
            CanonicalField::TreasuryStock => self.treasury_stock,
            CanonicalField::SharesOutstanding => self.shares_outstanding,
            CanonicalField::CurrentPrice => self.current_price,
            CanonicalField::MarketCap => self.market_cap,
            CanonicalField::DividendsPerShare => self.dividends_per_share,
        }
    }

    pub fn set(&mut self, field: CanonicalField, value: Option<f64>) {
        let slot = match field {
            CanonicalField::NetIncome => &mut self.net_income,
            CanonicalField::OperatingCashFlow => &mut self.operating_cash_flow,
            CanonicalField::CapitalExpenditures => &mut self.capital_expenditures,
            CanonicalField::DepreciationAmortization => &mut self.depreciation_amortization,
            CanonicalField::DividendsPaid => &mut self.dividends_paid,
            CanonicalField::ShareholderEquity => &mut self.shareholder_equity,
            CanonicalField::LongTermDebt => &mut self.long_term_debt,
            CanonicalField::ShortTermDebt => &mut self.short_term_debt,
            CanonicalField::CashAndEquivalents => &mut self.cash_and_equivalents,
            CanonicalField::CapitalLeases => &mut self.capital_leases,
            CanonicalField::MinorityInterest => &mut self.minority_interest,
            CanonicalField::PreferredStock => &mut self.preferred_stock,
            CanonicalField::TreasuryStock => &mut self.treasury_stock,
            CanonicalField::SharesOutstanding => &mut self.shares_outstanding,
            CanonicalField::CurrentPrice => &mut self.current_price,
            CanonicalField::MarketCap => &mut self.market_cap,
            CanonicalField::DividendsPerShare => &mut self.dividends_per_share,
        };
        *slot = value;
    }
}

/// A valuation input as shown to the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub value: Option<f64>,
}

/// Profitability and leverage ratios. Each is absent when its inputs are
/// absent or its denominator is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    pub roe: Option<f64>,
    pub invested_capital: Option<f64>,
    pub retained_earnings: Option<f64>,
    pub roic: Option<f64>,
    pub sgr: Option<f64>,
    pub retained_rate: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub cash_to_debt: Option<f64>,
}

/// Output of one valuation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    /// Earnings measure the free cash flow was built on.
    pub earnings: f64,
    /// `-max(|capex|, |ddna|)`.
    pub adjusted_cost: f64,
    pub free_cash_flow: f64,
    /// Undiscounted cash flow for years 1..=H.
    pub projected_cash_flows: Vec<f64>,
    pub discounted_cash_flows: Vec<f64>,
    pub terminal_value: Option<f64>,
    pub discounted_terminal_value: Option<f64>,
    pub cash: f64,
    pub total_debt: f64,
    /// Value before the margin of safety.
    pub intrinsic_value: f64,
    /// Value after the margin of safety.
    pub total_value: f64,
    pub per_share: Option<f64>,
    pub ratios: RatioSet,
    pub components: Vec<Component>,
    pub assumptions: ValuationConfig,
}

/// Per-share value against market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Undervalued,
    FairlyValued,
    Overvalued,
    Indeterminate,
}

impl Verdict {
    pub fn to_label(&self) -> &'static str {
        match self {
            Verdict::Undervalued => "Undervalued",
            Verdict::FairlyValued => "Fairly Valued",
            Verdict::Overvalued => "Overvalued",
            Verdict::Indeterminate => "Indeterminate",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// What the presentation layer receives for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub symbol: String,
    pub result: ValuationResult,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub verdict: Verdict,
    /// `(per_share - price) / price`.
    pub upside: Option<f64>,
}
