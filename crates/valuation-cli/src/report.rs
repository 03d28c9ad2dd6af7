use std::fmt;

use valuation_core::{TerminalValuePolicy, ValuationMethod, ValuationReport};

const NOT_FOUND: &str = "Not Found";

/// `$1,234.56`, with a leading minus for negatives.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

/// Fraction as a percentage: `0.1234` -> `12.34%`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn or_not_found(value: Option<f64>, format: fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Plain-text rendering of a report.
pub struct TextReport<'a>(pub &'a ValuationReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let result = &report.result;
        let assumptions = &result.assumptions;

        writeln!(f, "{} intrinsic value", report.symbol)?;
        writeln!(f)?;
        writeln!(
            f,
            "Value per share (with {} margin of safety): {}",
            format_percent(assumptions.margin_of_safety),
            or_not_found(result.per_share, format_currency)
        )?;
        writeln!(f, "Total value (with margin of safety): {}", format_currency(result.total_value))?;
        writeln!(f, "Current price: {}", or_not_found(report.current_price, format_currency))?;
        writeln!(f, "Verdict: {}", report.verdict)?;
        if let Some(upside) = report.upside {
            writeln!(f, "Upside: {}", format_percent(upside))?;
        }
        if let Some(market_cap) = report.market_cap {
            writeln!(f, "Market cap: {}", format_currency(market_cap))?;
        }
        if let Some(dividend_yield) = report.dividend_yield {
            writeln!(f, "Dividend yield: {}", format_percent(dividend_yield))?;
        }

        writeln!(f)?;
        writeln!(f, "Assumptions")?;
        writeln!(f, "- Method: {}", assumptions.method)?;
        writeln!(f, "- Earnings: {}", assumptions.earnings_measure)?;
        writeln!(f, "- Growth rate: {}", format_percent(assumptions.growth_rate))?;
        if assumptions.method == ValuationMethod::DiscountedCashFlow {
            writeln!(f, "- Discount rate: {}", format_percent(assumptions.discount_rate))?;
            let terminal = match assumptions.terminal {
                TerminalValuePolicy::Multiple { multiple } => format!("{multiple}x free cash flow"),
                TerminalValuePolicy::PerpetuityGrowth => "perpetuity growth".to_string(),
            };
            writeln!(f, "- Terminal value: {terminal}")?;
            writeln!(f, "- Debt netting: {}", assumptions.debt_netting)?;
        }
        writeln!(f, "- Horizon: {} years", assumptions.horizon_years)?;

        writeln!(f)?;
        writeln!(f, "Calculation details")?;
        writeln!(f, "- Free cash flow (owner earnings): {}", format_currency(result.free_cash_flow))?;
        let series = if result.discounted_cash_flows.is_empty() {
            ("Projected", &result.projected_cash_flows)
        } else {
            ("Discounted", &result.discounted_cash_flows)
        };
        let flows: Vec<String> = series.1.iter().copied().map(format_currency).collect();
        writeln!(
            f,
            "- {} cash flows ({} yrs): [{}]",
            series.0,
            series.1.len(),
            flows.join(", ")
        )?;
        if let Some(terminal) = result.terminal_value {
            writeln!(f, "- Terminal value (undiscounted): {}", format_currency(terminal))?;
        }
        if result.discounted_terminal_value.is_some() {
            writeln!(f, "- Cash: {}", format_currency(result.cash))?;
            writeln!(f, "- Total debt: {}", format_currency(result.total_debt))?;
        }
        writeln!(f, "- Value before margin of safety: {}", format_currency(result.intrinsic_value))?;

        let ratios = &result.ratios;
        writeln!(f)?;
        writeln!(f, "Ratios")?;
        for (name, value) in [
            ("Return on equity (ROE)", ratios.roe),
            ("Return on invested capital (ROIC)", ratios.roic),
            ("Sustainable growth rate", ratios.sgr),
            ("Retained rate", ratios.retained_rate),
            ("Debt to equity", ratios.debt_to_equity),
            ("Cash to debt", ratios.cash_to_debt),
        ] {
            writeln!(f, "- {name}: {}", or_not_found(value, format_percent))?;
        }

        writeln!(f)?;
        writeln!(f, "Components used for FCF calculation")?;
        for component in &result.components {
            writeln!(f, "- {}: {}", component.name, or_not_found(component.value, format_currency))?;
        }

        Ok(())
    }
}

pub fn render_text(report: &ValuationReport) -> String {
    TextReport(report).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use intrinsic_value::ValuationEngine;
    use valuation_core::{CanonicalFinancials, ValuationConfig, Verdict};

    #[test]
    fn test_currency_format() {
        assert_eq!(format_currency(1234.56), "$1,234.56");
        assert_eq!(format_currency(-9_447_000_000.0), "-$9,447,000,000.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(12.0), "$12.00");
        assert_eq!(format_currency(-0.001), "$0.00");
        assert_eq!(format_currency(100_000.0), "$100,000.00");
    }

    #[test]
    fn test_percent_format() {
        assert_eq!(format_percent(0.1234), "12.34%");
        assert_eq!(format_percent(0.16), "16.00%");
        assert_eq!(format_percent(-0.05), "-5.00%");
    }

    fn sample_report(shares: Option<f64>) -> ValuationReport {
        let financials = CanonicalFinancials {
            net_income: Some(1000.0),
            capital_expenditures: Some(-200.0),
            depreciation_amortization: Some(-150.0),
            shareholder_equity: Some(5000.0),
            cash_and_equivalents: Some(300.0),
            long_term_debt: Some(400.0),
            shares_outstanding: shares,
            ..Default::default()
        };
        let result = ValuationEngine::new()
            .value("CAES", &financials, &ValuationConfig::default())
            .unwrap();
        ValuationReport {
            symbol: "CAES".to_string(),
            result,
            current_price: Some(40.0),
            market_cap: None,
            dividend_yield: None,
            verdict: Verdict::Undervalued,
            upside: Some(1.5),
        }
    }

    #[test]
    fn test_text_report_sections() {
        let text = render_text(&sample_report(Some(100.0)));

        assert!(text.starts_with("CAES intrinsic value"));
        assert!(text.contains("with 30.00% margin of safety"));
        assert!(text.contains("- Free cash flow (owner earnings): $800.00"));
        assert!(text.contains("- Terminal value (undiscounted): $7,200.00"));
        assert!(text.contains("- Return on equity (ROE): 16.00%"));
        assert!(text.contains("- Capital Expenditures: -$200.00"));
        assert!(text.contains("- Capital Leases: Not Found"));
        assert!(text.contains("Verdict: Undervalued"));
        assert!(text.contains("Upside: 150.00%"));
        assert!(!text.contains("Market cap"));
    }

    #[test]
    fn test_simple_compounding_report_lists_projected_flows() {
        let mut report = sample_report(Some(100.0));
        report.result = ValuationEngine::new()
            .value(
                "CAES",
                &CanonicalFinancials {
                    net_income: Some(1000.0),
                    capital_expenditures: Some(-200.0),
                    depreciation_amortization: Some(-150.0),
                    shareholder_equity: Some(5000.0),
                    shares_outstanding: Some(100.0),
                    ..Default::default()
                },
                &ValuationConfig {
                    method: valuation_core::ValuationMethod::SimpleCompounding,
                    horizon_years: 2,
                    ..Default::default()
                },
            )
            .unwrap();

        let text = TextReport(&report).to_string();
        assert_eq!(text, render_text(&report));
        assert!(text.contains("- Projected cash flows (2 yrs): [$880.00, $968.00]"));
        assert!(!text.contains("Discount rate"));
        assert!(!text.contains("Terminal value"));
    }

    #[test]
    fn test_missing_per_share_is_not_found() {
        let text = render_text(&sample_report(None));
        assert!(text.contains("margin of safety): Not Found"));
        assert!(text.contains("Total value (with margin of safety): $"));
    }
}
