use super::CalculatedIndicator;
use crate::core::timeseries::{combine, TimeSeries};

/// `constant + Σ coefficient_i · input_i`, optionally taken in absolute value.
///
/// Covers the plain spreads (10Y-2Y, SOFR-IORB, CP-TBill), the net-liquidity
/// identity (WALCL - TGA - RRP), blended levels (0.6·5Y + 0.4·10Y TIPS) and
/// curve curvature (|2·10Y - 2Y - 30Y|). Inputs are inner-joined on date.
pub struct LinearCombination {
    slug: &'static str,
    terms: Vec<(&'static str, f64)>,
    constant: f64,
    absolute: bool,
}

impl LinearCombination {
    pub fn new(slug: &'static str, terms: &[(&'static str, f64)]) -> Self {
        Self {
            slug,
            terms: terms.to_vec(),
            constant: 0.0,
            absolute: false,
        }
    }

    /// `a - b`
    pub fn spread(slug: &'static str, a: &'static str, b: &'static str) -> Self {
        Self::new(slug, &[(a, 1.0), (b, -1.0)])
    }

    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = constant;
        self
    }

    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }
}

impl CalculatedIndicator for LinearCombination {
    fn slug(&self) -> &str {
        self.slug
    }

    fn required_inputs(&self) -> Vec<&str> {
        self.terms.iter().map(|(key, _)| *key).collect()
    }

    fn calculate(&self, inputs: &[&TimeSeries]) -> TimeSeries {
        if inputs.len() != self.terms.len() {
            return TimeSeries::default();
        }

        combine(inputs, |values| {
            let total = self.constant
                + values
                    .iter()
                    .zip(&self.terms)
                    .map(|(value, (_, coefficient))| value * coefficient)
                    .sum::<f64>();
            if self.absolute {
                total.abs()
            } else {
                total
            }
        })
    }
}

/// `numerator / denominator`; a zero denominator yields NaN, which is
/// dropped before scoring.
pub struct Ratio {
    slug: &'static str,
    numerator: &'static str,
    denominator: &'static str,
}

impl Ratio {
    pub fn new(slug: &'static str, numerator: &'static str, denominator: &'static str) -> Self {
        Self {
            slug,
            numerator,
            denominator,
        }
    }
}

impl CalculatedIndicator for Ratio {
    fn slug(&self) -> &str {
        self.slug
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec![self.numerator, self.denominator]
    }

    fn calculate(&self, inputs: &[&TimeSeries]) -> TimeSeries {
        let [numerator, denominator] = inputs else {
            return TimeSeries::default();
        };

        numerator.zip_with(denominator, |n, d| if d != 0.0 { n / d } else { f64::NAN })
    }
}
