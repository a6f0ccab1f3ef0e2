// 🧭 Scoping Classifier - Risk matrix from account balances vs. materiality
// Classification is a pure function of (balance, pm, te, ctt); risk and
// strategy are the only human-overridable fields and survive re-runs.

use crate::error::{AuditError, Result};
use crate::ledger::AccountBalance;
use crate::materiality::MaterialitySet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CLASSIFICATION TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Balance alone exceeds global materiality (pct >= 1.0).
    KeyItem,
    /// Balance at or above performance materiality.
    Significant,
    /// Between the trivial threshold and performance materiality.
    Relevant,
    /// Below the trivial threshold.
    Immaterial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStrategy {
    Substantive,
    Analytical,
    None,
}

impl Classification {
    /// Default test strategy for a freshly classified account.
    pub fn default_strategy(&self) -> TestStrategy {
        match self {
            Classification::KeyItem | Classification::Significant => TestStrategy::Substantive,
            Classification::Relevant => TestStrategy::Analytical,
            Classification::Immaterial => TestStrategy::None,
        }
    }
}

// ============================================================================
// SCOPING ENTRY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopingEntry {
    pub account_code: String,
    pub account_name: String,
    pub balance: f64,

    /// |balance| / pm
    pub pct_materiality: f64,

    pub classification: Classification,

    /// Human-overridable; preserved across re-classification.
    pub risk: RiskLevel,

    /// Human-overridable; preserved across re-classification.
    pub strategy: TestStrategy,
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classify every account against the engagement's materiality thresholds.
///
/// Hard precondition: a saved materiality set must exist. Output preserves
/// input order; every input account appears exactly once. Magnitudes use the
/// absolute balance so credit-natured accounts classify the same as debits.
pub fn classify(
    balances: &[AccountBalance],
    materiality: Option<&MaterialitySet>,
) -> Result<Vec<ScopingEntry>> {
    let materiality = materiality.ok_or(AuditError::MaterialityNotDefined)?;

    let entries = balances
        .iter()
        .map(|account| {
            let magnitude = account.balance.abs();
            let pct = magnitude / materiality.pm;

            let classification = if pct >= 1.0 {
                Classification::KeyItem
            } else if magnitude >= materiality.te {
                Classification::Significant
            } else if magnitude >= materiality.ctt {
                Classification::Relevant
            } else {
                Classification::Immaterial
            };

            ScopingEntry {
                account_code: account.account_code.clone(),
                account_name: account.account_name.clone(),
                balance: account.balance,
                pct_materiality: pct,
                classification,
                risk: RiskLevel::Medium,
                strategy: classification.default_strategy(),
            }
        })
        .collect();

    Ok(entries)
}

/// Fold previously stored risk/strategy overrides into a fresh classification.
///
/// Keyed upsert by account code: classification and pct_materiality always
/// come from the fresh run, risk and strategy come from the previous entries
/// where they exist. Accounts new to the fresh run keep their defaults.
pub fn merge_overrides(
    fresh: Vec<ScopingEntry>,
    previous: &[ScopingEntry],
) -> Vec<ScopingEntry> {
    let by_code: HashMap<&str, &ScopingEntry> = previous
        .iter()
        .map(|e| (e.account_code.as_str(), e))
        .collect();

    fresh
        .into_iter()
        .map(|mut entry| {
            if let Some(prior) = by_code.get(entry.account_code.as_str()) {
                entry.risk = prior.risk;
                entry.strategy = prior.strategy;
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materiality::Benchmark;

    fn materiality_set(pm: f64, te: f64, ctt: f64) -> MaterialitySet {
        MaterialitySet {
            benchmark: Benchmark::GrossRevenue,
            benchmark_value: pm * 20.0,
            pct_global: 5.0,
            pct_performance: te / pm * 100.0,
            pm,
            te,
            ctt,
            risk_score: 0,
            risks_identified: Vec::new(),
        }
    }

    fn account(code: &str, balance: f64) -> AccountBalance {
        AccountBalance {
            account_code: code.to_string(),
            account_name: format!("Account {}", code),
            account_type: crate::ledger::AccountType::Asset,
            balance,
        }
    }

    #[test]
    fn test_classification_tiers_end_to_end() {
        // PM=100k, TE=75k, CTT=5k.
        let materiality = materiality_set(100_000.0, 75_000.0, 5_000.0);
        let balances = vec![
            account("1", 120_000.0),
            account("2", 80_000.0),
            account("3", 20_000.0),
            account("4", 2_000.0),
        ];

        let entries = classify(&balances, Some(&materiality)).unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].classification, Classification::KeyItem);
        assert_eq!(entries[1].classification, Classification::Significant);
        assert_eq!(entries[2].classification, Classification::Relevant);
        assert_eq!(entries[3].classification, Classification::Immaterial);
    }

    #[test]
    fn test_default_risk_and_strategy() {
        let materiality = materiality_set(100_000.0, 75_000.0, 5_000.0);
        let balances = vec![
            account("key", 150_000.0),
            account("sig", 80_000.0),
            account("rel", 10_000.0),
            account("imm", 1_000.0),
        ];

        let entries = classify(&balances, Some(&materiality)).unwrap();

        for entry in &entries {
            assert_eq!(entry.risk, RiskLevel::Medium);
        }
        assert_eq!(entries[0].strategy, TestStrategy::Substantive);
        assert_eq!(entries[1].strategy, TestStrategy::Substantive);
        assert_eq!(entries[2].strategy, TestStrategy::Analytical);
        assert_eq!(entries[3].strategy, TestStrategy::None);
    }

    #[test]
    fn test_negative_balances_classify_by_magnitude() {
        let materiality = materiality_set(100_000.0, 75_000.0, 5_000.0);
        let entries = classify(&[account("2.1", -120_000.0)], Some(&materiality)).unwrap();

        assert_eq!(entries[0].classification, Classification::KeyItem);
        assert!((entries[0].pct_materiality - 1.2).abs() < 1e-9);
        // Sign preserved in the entry itself.
        assert_eq!(entries[0].balance, -120_000.0);
    }

    #[test]
    fn test_classify_without_materiality_fails() {
        let result = classify(&[account("1", 10_000.0)], None);
        assert!(matches!(result, Err(AuditError::MaterialityNotDefined)));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let materiality = materiality_set(100_000.0, 75_000.0, 5_000.0);
        let balances = vec![account("a", 74_999.0), account("b", 75_000.0), account("c", 5_000.0)];

        let first = classify(&balances, Some(&materiality)).unwrap();
        let second = classify(&balances, Some(&materiality)).unwrap();

        assert_eq!(first.len(), second.len());
        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.classification, y.classification);
            assert_eq!(x.pct_materiality, y.pct_materiality);
        }
        // Boundary semantics: exactly TE is Significant, exactly CTT is Relevant.
        assert_eq!(first[0].classification, Classification::Relevant);
        assert_eq!(first[1].classification, Classification::Significant);
        assert_eq!(first[2].classification, Classification::Relevant);
    }

    #[test]
    fn test_merge_preserves_manual_overrides() {
        let materiality = materiality_set(100_000.0, 75_000.0, 5_000.0);
        let balances = vec![account("1.1", 80_000.0), account("1.2", 10_000.0)];

        let mut previous = classify(&balances, Some(&materiality)).unwrap();
        // Auditor overrides account 1.1.
        previous[0].risk = RiskLevel::High;
        previous[0].strategy = TestStrategy::Analytical;

        // Materiality tightened: re-classify and merge.
        let tightened = materiality_set(50_000.0, 37_500.0, 2_500.0);
        let fresh = classify(&balances, Some(&tightened)).unwrap();
        let merged = merge_overrides(fresh, &previous);

        // Classification recomputed against the new thresholds...
        assert_eq!(merged[0].classification, Classification::KeyItem);
        // ...but the manual override survives.
        assert_eq!(merged[0].risk, RiskLevel::High);
        assert_eq!(merged[0].strategy, TestStrategy::Analytical);
        // Untouched account keeps defaults.
        assert_eq!(merged[1].risk, RiskLevel::Medium);
    }

    #[test]
    fn test_merge_keeps_defaults_for_new_accounts() {
        let materiality = materiality_set(100_000.0, 75_000.0, 5_000.0);
        let previous = classify(&[account("old", 80_000.0)], Some(&materiality)).unwrap();

        let fresh = classify(
            &[account("old", 80_000.0), account("new", 90_000.0)],
            Some(&materiality),
        )
        .unwrap();
        let merged = merge_overrides(fresh, &previous);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].account_code, "new");
        assert_eq!(merged[1].risk, RiskLevel::Medium);
        assert_eq!(merged[1].strategy, TestStrategy::Substantive);
    }
}
