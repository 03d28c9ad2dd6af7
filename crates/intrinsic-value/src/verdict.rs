use valuation_core::{Verdict, DEFAULT_VERDICT_BAND};

/// Labels a market price against a computed per-share value.
#[derive(Debug, Clone, Copy)]
pub struct VerdictClassifier {
    band: f64,
}

impl VerdictClassifier {
    pub fn new(band: f64) -> Self {
        Self { band: band.abs() }
    }

    /// `Undervalued` when the price sits more than `band` below the value,
    /// `Overvalued` when more than `band` above it, `FairlyValued` otherwise.
    pub fn classify(&self, per_share: Option<f64>, price: Option<f64>) -> Verdict {
        let (Some(value), Some(price)) = (per_share, price) else {
            return Verdict::Indeterminate;
        };
        if !value.is_finite() || !price.is_finite() {
            return Verdict::Indeterminate;
        }

        let tolerance = value.abs() * self.band;
        if price < value - tolerance {
            Verdict::Undervalued
        } else if price > value + tolerance {
            Verdict::Overvalued
        } else {
            Verdict::FairlyValued
        }
    }

    /// Fractional move from price to value; absent without a positive price.
    pub fn upside(per_share: Option<f64>, price: Option<f64>) -> Option<f64> {
        match (per_share, price) {
            (Some(value), Some(price)) if price > 0.0 => Some((value - price) / price).filter(|u| u.is_finite()),
            _ => None,
        }
    }
}

impl Default for VerdictClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_VERDICT_BAND)
    }
}
