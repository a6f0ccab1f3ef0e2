// ⚠️ Error Taxonomy - Typed failures returned to the caller
// Every precondition violation is recoverable; the core never panics on input.

use thiserror::Error;

/// Errors produced by the audit engines.
///
/// Three families:
/// - invalid input: out-of-range percentages, non-positive benchmarks
/// - precondition not met: missing materiality, unusable populations
/// - insufficient population: sample size exceeds available items
#[derive(Debug, Error, PartialEq)]
pub enum AuditError {
    /// Benchmark value must be strictly positive to anchor materiality.
    #[error("invalid benchmark value {value}: benchmark must be greater than zero")]
    InvalidBenchmark { value: f64 },

    /// Percentage parameters must lie in (0, 100].
    #[error("invalid {field} {value}: percentage must be greater than 0 and at most 100")]
    InvalidPercentage { field: &'static str, value: f64 },

    /// No trial-balance rows mapped to a standard account type.
    #[error("no mapped financial data: map the trial balance to standard accounts first")]
    NoMappedData,

    /// Scoping requires a saved materiality set for the engagement.
    #[error("materiality not defined: calculate and save materiality before running scoping")]
    MaterialityNotDefined,

    /// Random sampling never silently truncates.
    #[error("insufficient population: requested {requested} items but only {available} available")]
    InsufficientPopulation { requested: usize, available: usize },

    /// Benford's Law is unreliable on small populations.
    #[error("population too small for Benford analysis: {actual} usable amounts, minimum is {minimum}")]
    EmptyPopulation { minimum: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_actionable() {
        let err = AuditError::MaterialityNotDefined;
        assert!(err.to_string().contains("before running scoping"));

        let err = AuditError::InsufficientPopulation {
            requested: 50,
            available: 10,
        };
        assert!(err.to_string().contains("requested 50"));
        assert!(err.to_string().contains("only 10"));
    }
}
