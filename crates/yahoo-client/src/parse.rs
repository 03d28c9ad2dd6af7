//! Conversion of a Yahoo `quoteSummary` payload into [`FinancialStatements`].
//!
//! Kept free of I/O so the mapping can be exercised against recorded
//! responses.

use serde_json::Value;
use valuation_core::{
    CompanyFacts, FinancialStatements, ProviderError, RawStatementRow, StatementKind,
    StatementTable,
};

/// Period keys that carry metadata rather than line items.
const SKIPPED_KEYS: &[&str] = &["maxAge", "endDate"];

/// Module name and the array inside it holding one object per period.
fn statement_path(kind: StatementKind) -> (&'static str, &'static str) {
    match kind {
        StatementKind::CashFlow => ("cashflowStatementHistory", "cashflowStatements"),
        StatementKind::BalanceSheet => ("balanceSheetHistory", "balanceSheetStatements"),
        StatementKind::IncomeStatement => ("incomeStatementHistory", "incomeStatementHistory"),
    }
}

/// `shortLongTermDebt` -> `Short Long Term Debt`.
pub fn camel_to_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;

    for ch in key.chars() {
        match prev {
            None => label.extend(ch.to_uppercase()),
            Some(p) if ch.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()) => {
                label.push(' ');
                label.push(ch);
            }
            Some(p) if ch.is_ascii_digit() && p.is_alphabetic() => {
                label.push(' ');
                label.push(ch);
            }
            Some(_) => label.push(ch),
        }
        prev = Some(ch);
    }
    label
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; empty objects mean
/// "not reported".
pub fn raw_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("raw").and_then(Value::as_f64),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// One row per line item, values ordered like the periods (most recent first).
pub fn parse_statement(periods: &[Value]) -> StatementTable {
    let mut keys: Vec<&str> = Vec::new();
    for period in periods {
        let Some(map) = period.as_object() else { continue };
        for key in map.keys() {
            if !SKIPPED_KEYS.contains(&key.as_str()) && !keys.contains(&key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }

    keys.into_iter()
        .map(|key| {
            let values = periods
                .iter()
                .map(|period| period.get(key).and_then(raw_value))
                .collect();
            RawStatementRow::new(camel_to_label(key), values)
        })
        .collect()
}

fn module_value(result: &Value, module: &str, key: &str) -> Option<f64> {
    result.get(module).and_then(|m| m.get(key)).and_then(raw_value)
}

pub fn parse_facts(result: &Value) -> CompanyFacts {
    CompanyFacts {
        current_price: module_value(result, "price", "regularMarketPrice")
            .or_else(|| module_value(result, "financialData", "currentPrice")),
        shares_outstanding: module_value(result, "defaultKeyStatistics", "sharesOutstanding"),
        market_cap: module_value(result, "price", "marketCap")
            .or_else(|| module_value(result, "summaryDetail", "marketCap")),
        dividend_rate: module_value(result, "summaryDetail", "dividendRate"),
    }
}

/// Map a full `quoteSummary` response body.
pub fn parse_quote_summary(symbol: &str, body: &Value) -> Result<FinancialStatements, ProviderError> {
    let summary = body
        .get("quoteSummary")
        .ok_or_else(|| ProviderError::Malformed("missing quoteSummary object".to_string()))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
        if code.eq_ignore_ascii_case("not found") {
            return Err(ProviderError::TickerNotFound(symbol.to_string()));
        }
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or(code);
        return Err(ProviderError::Malformed(format!("provider error: {description}")));
    }

    let result = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .ok_or_else(|| ProviderError::TickerNotFound(symbol.to_string()))?;

    let mut tables = Vec::with_capacity(StatementKind::ALL.len());
    for kind in StatementKind::ALL {
        let (module, array) = statement_path(kind);
        let periods = result
            .get(module)
            .and_then(|m| m.get(array))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let table = parse_statement(periods);
        if table.is_empty() {
            return Err(ProviderError::StatementUnavailable {
                symbol: symbol.to_string(),
                statement: kind.to_label().to_string(),
            });
        }
        tracing::debug!(symbol, statement = %kind, rows = table.len(), periods = periods.len(), "Parsed statement");
        tables.push(table);
    }

    let mut tables = tables.into_iter();
    let (Some(cash_flow), Some(balance_sheet), Some(income_statement)) =
        (tables.next(), tables.next(), tables.next())
    else {
        return Err(ProviderError::Malformed("statement count mismatch".to_string()));
    };

    Ok(FinancialStatements {
        symbol: symbol.to_string(),
        cash_flow,
        balance_sheet,
        income_statement,
        facts: parse_facts(result),
    })
}
