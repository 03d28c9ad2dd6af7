use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use valuation_core::{
    DebtNetting, EarningsMeasure, TerminalValuePolicy, ValuationConfig, ValuationMethod,
    DEFAULT_TERMINAL_MULTIPLE,
};

const MAX_GROWTH_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TerminalArg {
    Multiple,
    Perpetuity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Flags override the matching `CAESAR_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "caesar-value")]
#[command(about = "Owner-earnings discounted cash flow valuation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Ticker symbol, e.g. AAPL
    pub ticker: String,

    /// Expected annual growth, percent (0-50)
    #[arg(short, long, value_parser = parse_growth)]
    pub growth: Option<f64>,

    /// Discount rate, percent
    #[arg(short, long, value_parser = parse_percent)]
    pub discount: Option<f64>,

    /// Margin of safety, percent
    #[arg(long, value_parser = parse_percent)]
    pub margin_of_safety: Option<f64>,

    /// Projection horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    #[arg(long, value_enum)]
    pub terminal: Option<TerminalArg>,

    /// Terminal multiple of base free cash flow
    #[arg(long)]
    pub multiple: Option<f64>,

    /// net-income or operating-cash-flow
    #[arg(long)]
    pub earnings: Option<EarningsMeasure>,

    /// dcf or simple-compounding
    #[arg(long)]
    pub method: Option<ValuationMethod>,

    /// magnitude or signed
    #[arg(long)]
    pub debt_netting: Option<DebtNetting>,

    /// Fair-value band around per-share value, percent
    #[arg(long, value_parser = parse_percent)]
    pub band: Option<f64>,

    /// Read statements from a JSON snapshot instead of Yahoo Finance
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

fn parse_percent(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if !value.is_finite() {
        return Err(format!("'{s}' is not a finite number"));
    }
    Ok(value)
}

fn parse_growth(s: &str) -> Result<f64, String> {
    let value = parse_percent(s)?;
    if !(0.0..=MAX_GROWTH_PERCENT).contains(&value) {
        return Err(format!("growth must be between 0 and {MAX_GROWTH_PERCENT}%"));
    }
    Ok(value)
}

impl Cli {
    /// Layer the flags that were given on top of `config`.
    pub fn apply(&self, mut config: ValuationConfig) -> ValuationConfig {
        if let Some(growth) = self.growth {
            config.growth_rate = growth / 100.0;
        }
        if let Some(discount) = self.discount {
            config.discount_rate = discount / 100.0;
        }
        if let Some(mos) = self.margin_of_safety {
            config.margin_of_safety = mos / 100.0;
        }
        if let Some(band) = self.band {
            config.verdict_band = band / 100.0;
        }
        if let Some(years) = self.years {
            config.horizon_years = years;
        }
        if let Some(earnings) = self.earnings {
            config.earnings_measure = earnings;
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(netting) = self.debt_netting {
            config.debt_netting = netting;
        }

        let current_multiple = match config.terminal {
            TerminalValuePolicy::Multiple { multiple } => multiple,
            TerminalValuePolicy::PerpetuityGrowth => DEFAULT_TERMINAL_MULTIPLE,
        };
        config.terminal = match (self.terminal, self.multiple) {
            (Some(TerminalArg::Perpetuity), _) => TerminalValuePolicy::PerpetuityGrowth,
            (Some(TerminalArg::Multiple), multiple) => TerminalValuePolicy::Multiple {
                multiple: multiple.unwrap_or(current_multiple),
            },
            (None, Some(multiple)) => TerminalValuePolicy::Multiple { multiple },
            (None, None) => config.terminal,
        };

        config
    }
}
