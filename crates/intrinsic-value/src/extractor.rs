//! Maps free-text statement labels onto canonical fields.
//!
//! Matching is driven by [`FIELD_RULES`]: each canonical field names the
//! statement it lives in, a label pattern, and whether the first matching
//! row wins or every matching row is summed. Labels are case-folded and
//! searched by substring only.

use valuation_core::{
    CanonicalField, CanonicalFinancials, FinancialStatements, StatementKind, StatementTable,
    ValuationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    FirstMatch,
    SumAll,
}

/// Sign applied to each matched value before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignConvention {
    AsReported,
    /// Cost items: `-|v|` whatever sign the statement used.
    NonPositive,
}

impl SignConvention {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            SignConvention::AsReported => value,
            SignConvention::NonPositive => -value.abs(),
        }
    }
}

/// Substring predicate over a case-folded label.
///
/// A label matches when it contains one of `any_of` or equals one of
/// `exact` (both empty means no requirement), contains every entry of
/// `all_of`, and contains none of `none_of`.
#[derive(Debug, Clone, Copy)]
pub struct LabelPattern {
    pub any_of: &'static [&'static str],
    pub exact: &'static [&'static str],
    pub all_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
}

impl LabelPattern {
    const fn any(any_of: &'static [&'static str]) -> Self {
        Self {
            any_of,
            exact: &[],
            all_of: &[],
            none_of: &[],
        }
    }

    const fn excluding(self, none_of: &'static [&'static str]) -> Self {
        Self { none_of, ..self }
    }

    pub fn matches(&self, label: &str) -> bool {
        let label = label.trim().to_lowercase();

        let anchored = (self.any_of.is_empty() && self.exact.is_empty())
            || self.any_of.iter().any(|p| label.contains(p))
            || self.exact.iter().any(|e| label == *e);

        anchored
            && self.all_of.iter().all(|p| label.contains(p))
            && !self.none_of.iter().any(|p| label.contains(p))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: CanonicalField,
    pub statement: StatementKind,
    pub pattern: LabelPattern,
    pub aggregation: Aggregation,
    pub sign: SignConvention,
}

const fn first(field: CanonicalField, statement: StatementKind, pattern: LabelPattern) -> FieldRule {
    FieldRule {
        field,
        statement,
        pattern,
        aggregation: Aggregation::FirstMatch,
        sign: SignConvention::AsReported,
    }
}

impl FieldRule {
    const fn costs(self) -> Self {
        Self {
            sign: SignConvention::NonPositive,
            ..self
        }
    }
}

/// Statement-sourced fields. Short-term debt is its own rule, and the
/// long-term rule excludes its label, so "Short Long Term Debt" never lands
/// in long-term debt.
pub const FIELD_RULES: &[FieldRule] = &[
    first(
        CanonicalField::NetIncome,
        StatementKind::IncomeStatement,
        LabelPattern::any(&["net income"]),
    ),
    first(
        CanonicalField::OperatingCashFlow,
        StatementKind::CashFlow,
        LabelPattern::any(&["operating activities", "operating cash flow"])
            .excluding(&["discontinued"]),
    ),
    first(
        CanonicalField::CapitalExpenditures,
        StatementKind::CashFlow,
        LabelPattern::any(&["capital expend"]),
    )
    .costs(),
    FieldRule {
        field: CanonicalField::DepreciationAmortization,
        statement: StatementKind::CashFlow,
        pattern: LabelPattern::any(&["depreciation", "amortization", "depletion"]),
        aggregation: Aggregation::SumAll,
        sign: SignConvention::NonPositive,
    },
    first(
        CanonicalField::DividendsPaid,
        StatementKind::CashFlow,
        LabelPattern::any(&["dividends paid"]),
    ),
    first(
        CanonicalField::ShareholderEquity,
        StatementKind::BalanceSheet,
        LabelPattern {
            any_of: &[],
            exact: &[],
            all_of: &["stockholder", "equity"],
            none_of: &["liabilities"],
        },
    ),
    first(
        CanonicalField::LongTermDebt,
        StatementKind::BalanceSheet,
        LabelPattern::any(&["long term debt"]).excluding(&["short long term debt", "current"]),
    ),
    first(
        CanonicalField::ShortTermDebt,
        StatementKind::BalanceSheet,
        LabelPattern::any(&["short long term debt", "short term debt"]),
    ),
    first(
        CanonicalField::CashAndEquivalents,
        StatementKind::BalanceSheet,
        LabelPattern {
            any_of: &["cash and cash"],
            exact: &["cash"],
            all_of: &[],
            none_of: &[],
        },
    ),
    first(
        CanonicalField::CapitalLeases,
        StatementKind::BalanceSheet,
        LabelPattern::any(&["capital lease"]).excluding(&["debt"]),
    ),
    first(
        CanonicalField::MinorityInterest,
        StatementKind::BalanceSheet,
        LabelPattern::any(&["minority interest"]),
    ),
    first(
        CanonicalField::PreferredStock,
        StatementKind::BalanceSheet,
        LabelPattern::any(&["preferred stock"]),
    ),
    first(
        CanonicalField::TreasuryStock,
        StatementKind::BalanceSheet,
        LabelPattern::any(&["treasury stock"]),
    ),
];

/// Apply one rule to one statement.
pub fn apply_rule(rule: &FieldRule, table: &StatementTable) -> Option<f64> {
    let mut matches = table
        .iter()
        .filter(|row| rule.pattern.matches(&row.label))
        .filter_map(|row| {
            let value = row.latest();
            if value.is_none() {
                tracing::debug!(label = %row.label, field = %rule.field, "Matching row has no reported value");
            }
            value.map(|v| (row.label.as_str(), rule.sign.apply(v)))
        });

    match rule.aggregation {
        Aggregation::FirstMatch => matches.next().map(|(label, value)| {
            tracing::debug!(field = %rule.field, label, value, "Matched statement row");
            value
        }),
        Aggregation::SumAll => matches.fold(None, |total, (label, value)| {
            tracing::debug!(field = %rule.field, label, value, "Summing statement row");
            Some(total.unwrap_or(0.0) + value)
        }),
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    rules: &'static [FieldRule],
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self { rules: FIELD_RULES }
    }

    /// Build a canonical snapshot. Fails with `DataUnavailable` before any
    /// scan when a statement is missing or empty.
    pub fn extract(&self, statements: &FinancialStatements) -> Result<CanonicalFinancials, ValuationError> {
        let missing: Vec<&str> = StatementKind::ALL
            .iter()
            .filter(|kind| statements.statement(**kind).is_empty())
            .map(|kind| kind.to_label())
            .collect();
        if !missing.is_empty() {
            return Err(ValuationError::DataUnavailable(format!(
                "{} missing or empty for {}",
                missing.join(", "),
                statements.symbol
            )));
        }

        let mut financials = CanonicalFinancials::default();
        for rule in self.rules {
            let value = apply_rule(rule, statements.statement(rule.statement));
            if value.is_none() {
                tracing::debug!(field = %rule.field, statement = %rule.statement, "No matching row");
            }
            financials.set(rule.field, value);
        }

        let facts = &statements.facts;
        financials.shares_outstanding = facts.shares_outstanding.filter(|v| v.is_finite());
        financials.current_price = facts.current_price.filter(|v| v.is_finite());
        financials.market_cap = facts.market_cap.filter(|v| v.is_finite());
        financials.dividends_per_share = facts.dividend_rate.filter(|v| v.is_finite());

        Ok(financials)
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::RawStatementRow;

    fn rule_for(field: CanonicalField) -> &'static FieldRule {
        FIELD_RULES.iter().find(|r| r.field == field).unwrap()
    }

    fn table(rows: &[(&str, f64)]) -> StatementTable {
        rows.iter()
            .map(|(label, value)| RawStatementRow::with_values(*label, &[*value]))
            .collect()
    }

    #[test]
    fn test_short_long_term_debt_goes_to_short_term_only() {
        let balance = table(&[("Short Long Term Debt", 50.0), ("Long Term Debt", 400.0)]);

        assert_eq!(apply_rule(rule_for(CanonicalField::ShortTermDebt), &balance), Some(50.0));
        assert_eq!(apply_rule(rule_for(CanonicalField::LongTermDebt), &balance), Some(400.0));

        let only_short = table(&[("Short Long Term Debt", 50.0)]);
        assert_eq!(apply_rule(rule_for(CanonicalField::LongTermDebt), &only_short), None);
    }

    #[test]
    fn test_first_match_wins_in_row_order() {
        let cash_flow = table(&[
            ("Capital Expenditure Reported", -120.0),
            ("Capital Expenditures", -200.0),
        ]);
        assert_eq!(
            apply_rule(rule_for(CanonicalField::CapitalExpenditures), &cash_flow),
            Some(-120.0)
        );
    }

    #[test]
    fn test_depreciation_rows_are_summed() {
        let cash_flow = table(&[
            ("Depreciation", -100.0),
            ("Net Income", 900.0),
            ("Amortization Of Intangibles", -30.0),
            ("Depletion", -20.0),
        ]);
        assert_eq!(
            apply_rule(rule_for(CanonicalField::DepreciationAmortization), &cash_flow),
            Some(-150.0)
        );
    }

    #[test]
    fn test_cost_items_are_non_positive_whatever_the_sign() {
        let cash_flow = table(&[
            ("Depreciation", 100.0),
            ("Amortization Of Intangibles", -30.0),
            ("Capital Expenditures", 50.0),
        ]);
        assert_eq!(
            apply_rule(rule_for(CanonicalField::DepreciationAmortization), &cash_flow),
            Some(-130.0)
        );
        assert_eq!(
            apply_rule(rule_for(CanonicalField::CapitalExpenditures), &cash_flow),
            Some(-50.0)
        );

        let dividends = table(&[("Dividends Paid", 80.0)]);
        assert_eq!(apply_rule(rule_for(CanonicalField::DividendsPaid), &dividends), Some(80.0));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let balance = table(&[("TOTAL STOCKHOLDER EQUITY", 5000.0)]);
        assert_eq!(
            apply_rule(rule_for(CanonicalField::ShareholderEquity), &balance),
            Some(5000.0)
        );
    }

    #[test]
    fn test_equity_skips_liabilities_total() {
        let balance = table(&[
            ("Total Liabilities And Stockholders Equity", 9000.0),
            ("Stockholders Equity", 5000.0),
        ]);
        assert_eq!(
            apply_rule(rule_for(CanonicalField::ShareholderEquity), &balance),
            Some(5000.0)
        );
    }

    #[test]
    fn test_cash_matches_bare_label_and_long_form() {
        let rule = rule_for(CanonicalField::CashAndEquivalents);
        assert_eq!(apply_rule(rule, &table(&[("Cash", 300.0)])), Some(300.0));
        assert_eq!(
            apply_rule(rule, &table(&[("Cash And Cash Equivalents", 310.0)])),
            Some(310.0)
        );
        assert_eq!(apply_rule(rule, &table(&[("Cash Dividends Paid", -5.0)])), None);
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let cash_flow = StatementTable::new(vec![
            RawStatementRow::new("Capital Expenditures", vec![None, None]),
            RawStatementRow::new("Capital Expenditure", vec![None, Some(-75.0)]),
        ]);
        assert_eq!(
            apply_rule(rule_for(CanonicalField::CapitalExpenditures), &cash_flow),
            Some(-75.0)
        );
    }

    #[test]
    fn test_unmatched_field_stays_absent() {
        let cash_flow = table(&[("Net Income", 1000.0)]);
        assert_eq!(apply_rule(rule_for(CanonicalField::CapitalExpenditures), &cash_flow), None);
        assert_eq!(apply_rule(rule_for(CanonicalField::DepreciationAmortization), &cash_flow), None);
    }

    #[test]
    fn test_empty_statement_fails_before_scanning() {
        let statements = FinancialStatements {
            symbol: "AAPL".to_string(),
            cash_flow: table(&[("Capital Expenditures", -200.0)]),
            income_statement: table(&[("Net Income", 1000.0)]),
            ..Default::default()
        };
        let err = FieldExtractor::new().extract(&statements).unwrap_err();
        match err {
            ValuationError::DataUnavailable(msg) => {
                assert!(msg.contains("Balance sheet"));
                assert!(!msg.contains("Income statement"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
