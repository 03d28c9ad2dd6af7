use approx::assert_relative_eq;
use intrinsic_value::FieldExtractor;
use valuation_core::{StatementKind, ValuationConfig};
use yahoo_client::parse_quote_summary;

fn fixture() -> serde_json::Value {
    serde_json::from_str(include_str!("fixtures/quote_summary.json")).unwrap()
}

#[test]
fn recorded_response_maps_to_statements() {
    let statements = parse_quote_summary("AAPL", &fixture()).unwrap();

    assert_eq!(statements.symbol, "AAPL");
    for kind in StatementKind::ALL {
        assert!(!statements.statement(kind).is_empty(), "{kind} is empty");
    }

    let labels: Vec<&str> = statements.balance_sheet.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        &labels[..4],
        &["Cash", "Short Term Investments", "Short Long Term Debt", "Long Term Debt"]
    );

    let buybacks = statements
        .cash_flow
        .iter()
        .find(|r| r.label == "Repurchase Of Stock")
        .unwrap();
    assert_eq!(buybacks.values, vec![Some(-94_949_000_000.0), None]);

    assert_eq!(statements.facts.current_price, Some(227.55));
    assert_eq!(statements.facts.shares_outstanding, Some(15_115_800_000.0));
    assert_eq!(statements.facts.dividend_rate, Some(1.0));
}

#[test]
fn recorded_response_extracts_and_values() {
    let statements = parse_quote_summary("AAPL", &fixture()).unwrap();
    let financials = FieldExtractor::new().extract(&statements).unwrap();

    assert_eq!(financials.net_income, Some(93_736_000_000.0));
    assert_eq!(financials.capital_expenditures, Some(-9_447_000_000.0));
    assert_eq!(financials.depreciation_amortization, Some(-11_445_000_000.0));
    assert_eq!(financials.short_term_debt, Some(10_912_000_000.0));
    assert_eq!(financials.long_term_debt, Some(85_750_000_000.0));
    assert_eq!(financials.cash_and_equivalents, Some(29_943_000_000.0));
    assert_eq!(financials.shareholder_equity, Some(56_950_000_000.0));

    let result = intrinsic_value::ValuationEngine::new()
        .value("AAPL", &financials, &ValuationConfig::default())
        .unwrap();
    assert_relative_eq!(result.free_cash_flow, 82_291_000_000.0, epsilon = 1.0);
    assert_eq!(result.total_debt, 96_662_000_000.0);
    assert!(result.per_share.is_some());
}
