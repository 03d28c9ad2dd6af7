use chrono::Utc;
use valuation_core::{
    CanonicalField, CanonicalFinancials, Component, DebtNetting, EarningsMeasure, RatioSet,
    TerminalValuePolicy, ValuationConfig, ValuationError, ValuationMethod, ValuationResult,
};

/// Cost deducted from earnings: the larger of the two cost items, as a
/// non-positive number.
pub fn adjusted_cost(capex: f64, ddna: f64) -> f64 {
    -capex.abs().max(ddna.abs())
}

/// Projected and discounted cash flows for years `1..=horizon`.
pub fn project_cash_flows(fcf: f64, growth_rate: f64, discount_rate: f64, horizon: u32) -> (Vec<f64>, Vec<f64>) {
    (0..horizon)
        .scan((fcf, 1.0), |(projected, discount), _| {
            *projected *= 1.0 + growth_rate;
            *discount *= 1.0 + discount_rate;
            Some((*projected, *projected / *discount))
        })
        .unzip()
}

/// Undiscounted terminal value at the end of the horizon.
pub fn terminal_value(
    policy: TerminalValuePolicy,
    fcf: f64,
    last_projected: f64,
    discount_rate: f64,
    growth_rate: f64,
) -> Result<f64, ValuationError> {
    match policy {
        TerminalValuePolicy::Multiple { multiple } => Ok(multiple * fcf),
        TerminalValuePolicy::PerpetuityGrowth => {
            if discount_rate <= growth_rate {
                return Err(ValuationError::UndefinedTerminalValue {
                    discount_rate,
                    growth_rate,
                });
            }
            Ok(last_projected * (1.0 + growth_rate) / (discount_rate - growth_rate))
        }
    }
}

/// Combined short- and long-term debt, or `None` when neither was reported.
pub fn total_debt(short_term: Option<f64>, long_term: Option<f64>, netting: DebtNetting) -> Option<f64> {
    if short_term.is_none() && long_term.is_none() {
        return None;
    }
    let normalise = |v: f64| match netting {
        DebtNetting::Magnitude => v.abs(),
        DebtNetting::Signed => v,
    };
    Some(short_term.map_or(0.0, normalise) + long_term.map_or(0.0, normalise))
}

/// `numerator / denominator`, absent when either side is absent, the
/// denominator is zero, or the quotient is not finite.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|q| q.is_finite()),
        _ => None,
    }
}

pub fn compute_ratios(fcf: f64, financials: &CanonicalFinancials, netting: DebtNetting) -> RatioSet {
    let equity = financials.shareholder_equity;
    let cash = financials.cash_and_equivalents;
    let dividends = financials.dividends_paid;
    let debt = total_debt(financials.short_term_debt, financials.long_term_debt, netting);

    let invested_capital = equity.map(|equity| {
        equity
            + financials.long_term_debt.unwrap_or(0.0)
            + financials.short_term_debt.unwrap_or(0.0)
            + financials.capital_leases.unwrap_or(0.0)
            + financials.minority_interest.unwrap_or(0.0)
            - cash.unwrap_or(0.0)
    });

    // Only a reported outflow (negative) adjusts retained earnings.
    let dividend_outflow = dividends.filter(|d| *d < 0.0).unwrap_or(0.0);
    let retained_earnings = fcf - dividend_outflow;
    let roic = ratio(Some(retained_earnings), invested_capital);

    let sgr = match (roic, dividends) {
        (Some(roic), Some(dividends)) if roic > 0.0 => {
            ratio(Some(fcf + dividends), Some(fcf)).map(|payout| roic * payout)
        }
        _ => None,
    };

    RatioSet {
        roe: ratio(Some(fcf), equity),
        invested_capital,
        retained_earnings: Some(retained_earnings),
        roic,
        sgr,
        retained_rate: ratio(dividends.map(|d| fcf + d), Some(fcf - dividend_outflow)),
        debt_to_equity: ratio(debt, equity),
        cash_to_debt: ratio(cash, debt),
    }
}

/// Canonical inputs used by a run, with cost items already normalised.
fn components(financials: &CanonicalFinancials, capex: f64, ddna: f64) -> Vec<Component> {
    const SHOWN: [CanonicalField; 13] = [
        CanonicalField::NetIncome,
        CanonicalField::OperatingCashFlow,
        CanonicalField::CapitalExpenditures,
        CanonicalField::DepreciationAmortization,
        CanonicalField::DividendsPaid,
        CanonicalField::ShareholderEquity,
        CanonicalField::CashAndEquivalents,
        CanonicalField::LongTermDebt,
        CanonicalField::ShortTermDebt,
        CanonicalField::CapitalLeases,
        CanonicalField::MinorityInterest,
        CanonicalField::PreferredStock,
        CanonicalField::TreasuryStock,
    ];

    SHOWN
        .iter()
        .map(|field| {
            let value = match field {
                CanonicalField::CapitalExpenditures => Some(capex),
                CanonicalField::DepreciationAmortization => Some(ddna),
                other => financials.get(*other),
            };
            Component {
                name: field.to_label().to_string(),
                value,
            }
        })
        .collect()
}

/// Turns a canonical snapshot into a valuation. Pure: no I/O, no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn value(
        &self,
        symbol: &str,
        financials: &CanonicalFinancials,
        config: &ValuationConfig,
    ) -> Result<ValuationResult, ValuationError> {
        config.validate()?;

        let earnings_field = match config.earnings_measure {
            EarningsMeasure::NetIncome => CanonicalField::NetIncome,
            EarningsMeasure::OperatingCashFlow => CanonicalField::OperatingCashFlow,
        };
        let (earnings, capex, ddna) = match (
            financials.get(earnings_field),
            financials.capital_expenditures,
            financials.depreciation_amortization,
            financials.shareholder_equity,
        ) {
            (Some(earnings), Some(capex), Some(ddna), Some(_)) => (earnings, capex, ddna),
            (earnings, capex, ddna, equity) => {
                let missing: Vec<String> = [
                    (earnings_field, earnings),
                    (CanonicalField::CapitalExpenditures, capex),
                    (CanonicalField::DepreciationAmortization, ddna),
                    (CanonicalField::ShareholderEquity, equity),
                ]
                .iter()
                .filter(|(_, value)| value.is_none())
                .map(|(field, _)| field.to_label().to_string())
                .collect();
                tracing::warn!(symbol, ?missing, "Required components not found");
                return Err(ValuationError::MissingComponents(missing));
            }
        };

        let capex = -capex.abs();
        let ddna = -ddna.abs();
        let cost = adjusted_cost(capex, ddna);
        let fcf = earnings + cost;
        tracing::debug!(symbol, earnings, capex, ddna, fcf, "Free cash flow");

        let r = config.discount_rate;
        let g = config.growth_rate;
        let horizon = config.horizon_years;
        let horizon_exp = i32::try_from(horizon).map_err(|_| {
            ValuationError::InvalidAssumption(format!("horizon_years {horizon} is out of range"))
        })?;
        let cash = financials.cash_and_equivalents.unwrap_or(0.0);
        let debt = total_debt(
            financials.short_term_debt,
            financials.long_term_debt,
            config.debt_netting,
        )
        .unwrap_or(0.0);

        let (projected, discounted, terminal, discounted_terminal, intrinsic_value) = match config.method {
            ValuationMethod::DiscountedCashFlow => {
                let (projected, discounted) = project_cash_flows(fcf, g, r, horizon);
                let last_projected = projected.last().copied().unwrap_or(fcf);
                let terminal = terminal_value(config.terminal, fcf, last_projected, r, g)?;
                let discounted_terminal = terminal / (1.0 + r).powi(horizon_exp);
                let total = discounted.iter().sum::<f64>() + discounted_terminal + cash - debt;
                (projected, discounted, Some(terminal), Some(discounted_terminal), total)
            }
            ValuationMethod::SimpleCompounding => {
                let (projected, _) = project_cash_flows(fcf, g, r, horizon);
                let compounded = projected.last().copied().unwrap_or(fcf);
                (projected, Vec::new(), None, None, compounded)
            }
        };

        if !intrinsic_value.is_finite() {
            return Err(ValuationError::Unexpected(format!(
                "intrinsic value for {symbol} is not finite"
            )));
        }

        let total_value = intrinsic_value * (1.0 - config.margin_of_safety);
        let per_share = financials
            .shares_outstanding
            .filter(|shares| shares.is_finite() && *shares > 0.0)
            .map(|shares| total_value / shares);
        if per_share.is_none() {
            tracing::warn!(symbol, "Shares outstanding unavailable; per-share value omitted");
        }

        Ok(ValuationResult {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            earnings,
            adjusted_cost: cost,
            free_cash_flow: fcf,
            projected_cash_flows: projected,
            discounted_cash_flows: discounted,
            terminal_value: terminal,
            discounted_terminal_value: discounted_terminal,
            cash,
            total_debt: debt,
            intrinsic_value,
            total_value,
            per_share,
            ratios: compute_ratios(fcf, financials, config.debt_netting),
            components: components(financials, capex, ddna),
            assumptions: config.clone(),
        })
    }
}
