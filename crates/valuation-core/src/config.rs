use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::ValuationError;

pub const DEFAULT_DISCOUNT_RATE: f64 = 0.06;
pub const DEFAULT_GROWTH_RATE: f64 = 0.10;
pub const DEFAULT_HORIZON_YEARS: u32 = 10;
pub const MAX_HORIZON_YEARS: u32 = 100;
pub const DEFAULT_TERMINAL_MULTIPLE: f64 = 9.0;
pub const DEFAULT_MARGIN_OF_SAFETY: f64 = 0.30;
pub const DEFAULT_VERDICT_BAND: f64 = 0.10;

/// Earnings figure free cash flow is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EarningsMeasure {
    #[default]
    NetIncome,
    OperatingCashFlow,
}

/// How value beyond the projection horizon is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "policy")]
pub enum TerminalValuePolicy {
    /// `multiple * fcf`
    Multiple { multiple: f64 },
    /// Gordon growth on the last projected year; needs `r > g`.
    PerpetuityGrowth,
}

impl Default for TerminalValuePolicy {
    fn default() -> Self {
        TerminalValuePolicy::Multiple {
            multiple: DEFAULT_TERMINAL_MULTIPLE,
        }
    }
}

/// How reported debt reduces the total value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebtNetting {
    /// Subtract `|short| + |long|` whatever sign the statement used.
    #[default]
    Magnitude,
    /// Subtract the debt figures as reported.
    Signed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValuationMethod {
    #[default]
    DiscountedCashFlow,
    /// `fcf * (1 + g)^H` with no discounting, terminal value or balance sheet netting.
    SimpleCompounding,
}

fn invalid(kind: &str, value: &str, expected: &str) -> ValuationError {
    ValuationError::InvalidAssumption(format!(
        "unknown {kind} '{value}' (expected {expected})"
    ))
}

impl FromStr for EarningsMeasure {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "net-income" | "ni" => Ok(EarningsMeasure::NetIncome),
            "operating-cash-flow" | "ocf" => Ok(EarningsMeasure::OperatingCashFlow),
            _ => Err(invalid(
                "earnings measure",
                s,
                "net-income or operating-cash-flow",
            )),
        }
    }
}

impl FromStr for DebtNetting {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "magnitude" => Ok(DebtNetting::Magnitude),
            "signed" => Ok(DebtNetting::Signed),
            _ => Err(invalid("debt netting", s, "magnitude or signed")),
        }
    }
}

impl FromStr for ValuationMethod {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "dcf" | "discounted-cash-flow" => Ok(ValuationMethod::DiscountedCashFlow),
            "simple" | "simple-compounding" => Ok(ValuationMethod::SimpleCompounding),
            _ => Err(invalid("valuation method", s, "dcf or simple-compounding")),
        }
    }
}

impl fmt::Display for EarningsMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EarningsMeasure::NetIncome => "net-income",
            EarningsMeasure::OperatingCashFlow => "operating-cash-flow",
        })
    }
}

impl fmt::Display for DebtNetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DebtNetting::Magnitude => "magnitude",
            DebtNetting::Signed => "signed",
        })
    }
}

impl fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValuationMethod::DiscountedCashFlow => "dcf",
            ValuationMethod::SimpleCompounding => "simple-compounding",
        })
    }
}

impl fmt::Display for TerminalValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalValuePolicy::Multiple { multiple } => write!(f, "{multiple}x FCF"),
            TerminalValuePolicy::PerpetuityGrowth => f.write_str("perpetuity growth"),
        }
    }
}

/// Every assumption the valuation depends on. Rates are fractions
/// (0.06 = 6%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub method: ValuationMethod,
    pub earnings_measure: EarningsMeasure,
    pub horizon_years: u32,
    pub discount_rate: f64,
    pub growth_rate: f64,
    pub terminal: TerminalValuePolicy,
    pub margin_of_safety: f64,
    pub debt_netting: DebtNetting,
    /// Tolerance around per-share value inside which a price is fair.
    pub verdict_band: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            method: ValuationMethod::default(),
            earnings_measure: EarningsMeasure::default(),
            horizon_years: DEFAULT_HORIZON_YEARS,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            growth_rate: DEFAULT_GROWTH_RATE,
            terminal: TerminalValuePolicy::default(),
            margin_of_safety: DEFAULT_MARGIN_OF_SAFETY,
            debt_netting: DebtNetting::default(),
            verdict_band: DEFAULT_VERDICT_BAND,
        }
    }
}

impl ValuationConfig {
    /// Load from `CAESAR_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with `lookup` standing in for
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: String| lookup(key).unwrap_or(default);

        let terminal = match var("CAESAR_TERMINAL", "multiple".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "multiple" => TerminalValuePolicy::Multiple {
                multiple: var("CAESAR_TERMINAL_MULTIPLE", DEFAULT_TERMINAL_MULTIPLE.to_string())
                    .trim()
                    .parse()
                    .context("CAESAR_TERMINAL_MULTIPLE must be a number")?,
            },
            "perpetuity" | "perpetuity-growth" => TerminalValuePolicy::PerpetuityGrowth,
            other => {
                return Err(invalid("terminal policy", other, "multiple or perpetuity").into())
            }
        };

        let config = Self {
            method: var("CAESAR_METHOD", "dcf".to_string()).parse()?,
            earnings_measure: var("CAESAR_EARNINGS", "net-income".to_string()).parse()?,
            horizon_years: var("CAESAR_HORIZON_YEARS", DEFAULT_HORIZON_YEARS.to_string())
                .trim()
                .parse()
                .context("CAESAR_HORIZON_YEARS must be a whole number")?,
            discount_rate: var("CAESAR_DISCOUNT_RATE", DEFAULT_DISCOUNT_RATE.to_string())
                .trim()
                .parse()
                .context("CAESAR_DISCOUNT_RATE must be a number")?,
            growth_rate: var("CAESAR_GROWTH_RATE", DEFAULT_GROWTH_RATE.to_string())
                .trim()
                .parse()
                .context("CAESAR_GROWTH_RATE must be a number")?,
            terminal,
            margin_of_safety: var("CAESAR_MARGIN_OF_SAFETY", DEFAULT_MARGIN_OF_SAFETY.to_string())
                .trim()
                .parse()
                .context("CAESAR_MARGIN_OF_SAFETY must be a number")?,
            debt_netting: var("CAESAR_DEBT_NETTING", "magnitude".to_string()).parse()?,
            verdict_band: var("CAESAR_VERDICT_BAND", DEFAULT_VERDICT_BAND.to_string())
                .trim()
                .parse()
                .context("CAESAR_VERDICT_BAND must be a number")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValuationError> {
        let finite = [
            ("discount_rate", self.discount_rate),
            ("growth_rate", self.growth_rate),
            ("margin_of_safety", self.margin_of_safety),
            ("verdict_band", self.verdict_band),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ValuationError::InvalidAssumption(format!(
                "{name} must be a finite number"
            )));
        }
        if self.discount_rate <= 0.0 || self.discount_rate >= 1.0 {
            return Err(ValuationError::InvalidAssumption(format!(
                "discount_rate must be between 0 and 1, got {}",
                self.discount_rate
            )));
        }
        if self.growth_rate <= -1.0 {
            return Err(ValuationError::InvalidAssumption(format!(
                "growth_rate must be greater than -1, got {}",
                self.growth_rate
            )));
        }
        if !(0.0..1.0).contains(&self.margin_of_safety) {
            return Err(ValuationError::InvalidAssumption(format!(
                "margin_of_safety must be in [0, 1), got {}",
                self.margin_of_safety
            )));
        }
        if self.horizon_years == 0 || self.horizon_years > MAX_HORIZON_YEARS {
            return Err(ValuationError::InvalidAssumption(format!(
                "horizon_years must be between 1 and {MAX_HORIZON_YEARS}, got {}",
                self.horizon_years
            )));
        }
        if self.verdict_band < 0.0 {
            return Err(ValuationError::InvalidAssumption(format!(
                "verdict_band must be non-negative, got {}",
                self.verdict_band
            )));
        }
        if let TerminalValuePolicy::Multiple { multiple } = self.terminal {
            if !multiple.is_finite() || multiple <= 0.0 {
                return Err(ValuationError::InvalidAssumption(format!(
                    "terminal multiple must be positive, got {multiple}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_variant() {
        let config = ValuationConfig::default();
        assert_eq!(config.horizon_years, 10);
        assert_eq!(config.discount_rate, 0.06);
        assert_eq!(config.margin_of_safety, 0.30);
        assert_eq!(config.terminal, TerminalValuePolicy::Multiple { multiple: 9.0 });
        assert_eq!(config.earnings_measure, EarningsMeasure::NetIncome);
        assert_eq!(config.debt_netting, DebtNetting::Magnitude);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_assumptions() {
        let bad = [
            ValuationConfig { discount_rate: 0.0, ..Default::default() },
            ValuationConfig { discount_rate: 1.0, ..Default::default() },
            ValuationConfig { growth_rate: -1.0, ..Default::default() },
            ValuationConfig { growth_rate: f64::NAN, ..Default::default() },
            ValuationConfig { margin_of_safety: 1.0, ..Default::default() },
            ValuationConfig { horizon_years: 0, ..Default::default() },
            ValuationConfig { horizon_years: 101, ..Default::default() },
            ValuationConfig { horizon_years: u32::MAX, ..Default::default() },
            ValuationConfig { verdict_band: -0.1, ..Default::default() },
            ValuationConfig {
                terminal: TerminalValuePolicy::Multiple { multiple: 0.0 },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(ValuationError::InvalidAssumption(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_policy_names_parse() {
        assert_eq!("ocf".parse::<EarningsMeasure>().unwrap(), EarningsMeasure::OperatingCashFlow);
        assert_eq!(
            "Operating_Cash_Flow".parse::<EarningsMeasure>().unwrap(),
            EarningsMeasure::OperatingCashFlow
        );
        assert_eq!("signed".parse::<DebtNetting>().unwrap(), DebtNetting::Signed);
        assert_eq!(
            "simple-compounding".parse::<ValuationMethod>().unwrap(),
            ValuationMethod::SimpleCompounding
        );
        assert!("owner-earnings".parse::<ValuationMethod>().is_err());
    }

    #[test]
    fn test_terminal_policy_serializes_tagged() {
        let json = serde_json::to_value(TerminalValuePolicy::Multiple { multiple: 9.0 }).unwrap();
        assert_eq!(json, serde_json::json!({"policy": "multiple", "multiple": 9.0}));
        let json = serde_json::to_value(TerminalValuePolicy::PerpetuityGrowth).unwrap();
        assert_eq!(json, serde_json::json!({"policy": "perpetuity-growth"}));
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_from_lookup_without_vars_is_default() {
        let config = ValuationConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ValuationConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let config = ValuationConfig::from_lookup(lookup(&[
            ("CAESAR_DISCOUNT_RATE", "0.08"),
            ("CAESAR_GROWTH_RATE", " 0.05 "),
            ("CAESAR_HORIZON_YEARS", "5"),
            ("CAESAR_TERMINAL", "Multiple"),
            ("CAESAR_TERMINAL_MULTIPLE", "12"),
            ("CAESAR_MARGIN_OF_SAFETY", "0.25"),
            ("CAESAR_EARNINGS", "operating-cash-flow"),
            ("CAESAR_METHOD", "simple"),
            ("CAESAR_DEBT_NETTING", "signed"),
            ("CAESAR_VERDICT_BAND", "0.15"),
        ]))
        .unwrap();

        assert_eq!(config.discount_rate, 0.08);
        assert_eq!(config.growth_rate, 0.05);
        assert_eq!(config.horizon_years, 5);
        assert_eq!(config.terminal, TerminalValuePolicy::Multiple { multiple: 12.0 });
        assert_eq!(config.margin_of_safety, 0.25);
        assert_eq!(config.earnings_measure, EarningsMeasure::OperatingCashFlow);
        assert_eq!(config.method, ValuationMethod::SimpleCompounding);
        assert_eq!(config.debt_netting, DebtNetting::Signed);
        assert_eq!(config.verdict_band, 0.15);
    }

    #[test]
    fn test_from_lookup_perpetuity_ignores_multiple() {
        let config = ValuationConfig::from_lookup(lookup(&[
            ("CAESAR_TERMINAL", "perpetuity"),
            ("CAESAR_TERMINAL_MULTIPLE", "not-a-number"),
        ]))
        .unwrap();
        assert_eq!(config.terminal, TerminalValuePolicy::PerpetuityGrowth);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = ValuationConfig::from_lookup(lookup(&[("CAESAR_TERMINAL", "gordon")])).unwrap_err();
        assert!(err.to_string().contains("unknown terminal policy 'gordon'"));

        let err = ValuationConfig::from_lookup(lookup(&[("CAESAR_TERMINAL_MULTIPLE", "nine")])).unwrap_err();
        assert!(err.to_string().contains("CAESAR_TERMINAL_MULTIPLE must be a number"));

        let err = ValuationConfig::from_lookup(lookup(&[("CAESAR_HORIZON_YEARS", "-3")])).unwrap_err();
        assert!(err.to_string().contains("CAESAR_HORIZON_YEARS must be a whole number"));

        let err = ValuationConfig::from_lookup(lookup(&[("CAESAR_METHOD", "owner-earnings")])).unwrap_err();
        assert!(err.to_string().contains("unknown valuation method"));

        let err = ValuationConfig::from_lookup(lookup(&[("CAESAR_HORIZON_YEARS", "500")])).unwrap_err();
        assert!(err.to_string().contains("horizon_years must be between 1 and 100"));
    }
}
