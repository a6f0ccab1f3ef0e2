// 🔢 Benford Analyzer - Leading-digit frequency analysis (NBC TA 520)
// Flags digits whose observed frequency deviates from log10(1 + 1/d) by more
// than five percentage points.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Absolute deviation above which a digit is flagged. Fixed by the reporting
/// contract, not configurable.
pub const ANOMALY_THRESHOLD: f64 = 0.05;

/// Benford's Law is statistically unreliable under a few dozen observations.
pub const DEFAULT_MIN_POPULATION: usize = 30;

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitDetail {
    pub digit: u8,
    pub expected: f64,
    pub observed: f64,
    pub deviation: f64,
    pub is_anomaly: bool,
}

/// Pure function of the amount population at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenfordResult {
    /// log10(1 + 1/d) for every digit 1..=9, always all nine keys.
    pub expected_frequencies: BTreeMap<u8, f64>,

    /// Observed share per digit, always all nine keys (zero when unseen).
    pub observed_frequencies: BTreeMap<u8, f64>,

    /// Digits whose absolute deviation exceeds the threshold.
    pub anomalies: Vec<u8>,

    pub details: Vec<DigitDetail>,

    /// Number of amounts that produced a usable leading digit.
    pub sample_size: usize,
}

// ============================================================================
// ANALYZER
// ============================================================================

pub struct BenfordAnalyzer {
    /// Minimum usable observations before analysis is allowed.
    pub min_population: usize,
}

impl BenfordAnalyzer {
    pub fn new() -> Self {
        BenfordAnalyzer {
            min_population: DEFAULT_MIN_POPULATION,
        }
    }

    /// For callers that accept the small-sample caveat (and for tests).
    pub fn with_min_population(min_population: usize) -> Self {
        BenfordAnalyzer { min_population }
    }

    /// Compute expected vs. observed leading-digit frequencies.
    ///
    /// Zero and non-finite amounts carry no leading digit and are discarded;
    /// sign and magnitude are ignored. Fails with `EmptyPopulation` when
    /// fewer than `min_population` usable digits remain.
    pub fn analyze(&self, amounts: &[f64]) -> Result<BenfordResult> {
        let mut counts: BTreeMap<u8, usize> = (1..=9u8).map(|d| (d, 0)).collect();
        let mut total = 0usize;

        for &amount in amounts {
            if let Some(digit) = leading_digit(amount) {
                *counts.get_mut(&digit).unwrap() += 1;
                total += 1;
            }
        }

        if total < self.min_population {
            return Err(AuditError::EmptyPopulation {
                minimum: self.min_population,
                actual: total,
            });
        }

        let mut expected_frequencies = BTreeMap::new();
        let mut observed_frequencies = BTreeMap::new();
        let mut anomalies = Vec::new();
        let mut details = Vec::with_capacity(9);

        for digit in 1..=9u8 {
            let expected = (1.0 + 1.0 / digit as f64).log10();
            let observed = counts[&digit] as f64 / total as f64;
            let deviation = (observed - expected).abs();
            let is_anomaly = deviation > ANOMALY_THRESHOLD;

            expected_frequencies.insert(digit, expected);
            observed_frequencies.insert(digit, observed);
            if is_anomaly {
                anomalies.push(digit);
            }
            details.push(DigitDetail {
                digit,
                expected,
                observed,
                deviation,
                is_anomaly,
            });
        }

        Ok(BenfordResult {
            expected_frequencies,
            observed_frequencies,
            anomalies,
            details,
            sample_size: total,
        })
    }
}

impl Default for BenfordAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Leading significant digit of an amount, sign- and magnitude-independent.
/// Returns None for zero and non-finite values.
fn leading_digit(amount: f64) -> Option<u8> {
    let mut v = amount.abs();
    if v == 0.0 || !v.is_finite() {
        return None;
    }

    while v >= 10.0 {
        v /= 10.0;
    }
    while v < 1.0 {
        v *= 10.0;
    }

    Some(v as u8)
}
