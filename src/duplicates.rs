// 🔍 Duplicate Payment Detection - Same amount, similar vendor, close dates
// Groups suspicious transactions for auditor review; it never deletes.

use crate::ledger::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// DUPLICATE GROUP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub group_id: usize,

    /// The exact amount shared by every transaction in the group.
    pub amount: f64,

    /// Human-readable reason for the flag.
    pub reason: String,

    pub transactions: Vec<Transaction>,
}

// ============================================================================
// DUPLICATE ENGINE
// ============================================================================

pub struct DuplicateEngine {
    /// Vendor similarity above which a pair is considered a match (0.0-1.0).
    pub vendor_similarity_threshold: f64,

    /// Maximum days between dates for a pair to match (when both have dates).
    pub date_window_days: i64,
}

impl DuplicateEngine {
    pub fn new() -> Self {
        DuplicateEngine {
            vendor_similarity_threshold: 0.85,
            date_window_days: 7,
        }
    }

    pub fn with_thresholds(vendor_similarity_threshold: f64, date_window_days: i64) -> Self {
        DuplicateEngine {
            vendor_similarity_threshold,
            date_window_days,
        }
    }

    /// Find groups of potential duplicate payments.
    ///
    /// Candidates share an exact amount (zero amounts are skipped); within a
    /// candidate set, vendors are compared with token-sort similarity and,
    /// when both transactions carry dates, the dates must fall within the
    /// window. Unparseable/missing dates fall back to the name match alone.
    pub fn find_duplicates(&self, transactions: &[Transaction]) -> Vec<DuplicateGroup> {
        // Bucket by exact amount. Float amounts come from the same ledger,
        // so bit-equality via the formatted value is the intended semantics.
        let mut by_amount: HashMap<String, Vec<&Transaction>> = HashMap::new();
        for tx in transactions {
            if tx.amount == 0.0 {
                continue;
            }
            by_amount
                .entry(format!("{:.2}", tx.amount))
                .or_default()
                .push(tx);
        }

        // Deterministic group ordering regardless of hash iteration.
        let mut buckets: Vec<(String, Vec<&Transaction>)> = by_amount
            .into_iter()
            .filter(|(_, txs)| txs.len() >= 2)
            .collect();
        buckets.sort_by(|a, b| a.1[0].id.cmp(&b.1[0].id));

        let mut groups = Vec::new();
        let mut group_id = 1;

        for (_, tx_list) in buckets {
            let n = tx_list.len();
            let mut visited = vec![false; n];

            for i in 0..n {
                if visited[i] {
                    continue;
                }

                let mut current: Vec<&Transaction> = vec![tx_list[i]];

                for j in (i + 1)..n {
                    if visited[j] {
                        continue;
                    }
                    if self.pair_matches(tx_list[i], tx_list[j]) {
                        current.push(tx_list[j]);
                        visited[j] = true;
                    }
                }

                if current.len() > 1 {
                    visited[i] = true;
                    let amount = current[0].amount;
                    groups.push(DuplicateGroup {
                        group_id,
                        amount,
                        reason: format!(
                            "Same amount ({:.2}) and similar vendor (>{:.0}%)",
                            amount,
                            self.vendor_similarity_threshold * 100.0
                        ),
                        transactions: current.into_iter().cloned().collect(),
                    });
                    group_id += 1;
                }
            }
        }

        groups
    }

    fn pair_matches(&self, t1: &Transaction, t2: &Transaction) -> bool {
        let similarity = token_sort_similarity(&t1.vendor, &t2.vendor);
        if similarity <= self.vendor_similarity_threshold {
            return false;
        }

        match (t1.date, t2.date) {
            (Some(d1), Some(d2)) => (d1 - d2).num_days().abs() <= self.date_window_days,
            // Missing dates: fall back to the name match alone.
            _ => true,
        }
    }
}

impl Default for DuplicateEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TOKEN-SORT SIMILARITY
// ============================================================================

/// Similarity in [0, 1]: lowercase, split on whitespace, sort tokens, then
/// normalized edit distance on the rejoined strings. Word order and casing
/// differences ("LTDA ACME" vs "Acme Ltda") score as identical.
pub fn token_sort_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize_tokens(a);
    let norm_b = normalize_tokens(b);

    if norm_a.is_empty() && norm_b.is_empty() {
        return 1.0;
    }

    let distance = edit_distance(&norm_a, &norm_b);
    let max_len = norm_a.chars().count().max(norm_b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - distance as f64 / max_len as f64
}

fn normalize_tokens(s: &str) -> String {
    let mut tokens: Vec<String> = s
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();
    tokens.sort();
    tokens.join(" ")
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(id: i64, vendor: &str, amount: f64, date: Option<(i32, u32, u32)>) -> Transaction {
        Transaction {
            id,
            vendor: vendor.to_string(),
            amount,
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            account_code: String::new(),
        }
    }

    #[test]
    fn test_token_sort_similarity() {
        assert_eq!(token_sort_similarity("ACME LTDA", "Ltda Acme"), 1.0);
        assert!(token_sort_similarity("ACME LTDA", "ACME LTDA SA") > 0.7);
        assert!(token_sort_similarity("ACME", "ZENITH CORP") < 0.5);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn test_exact_duplicates_grouped() {
        let engine = DuplicateEngine::new();
        let transactions = vec![
            tx(1, "ACME Ltda", 1_500.0, Some((2024, 3, 1))),
            tx(2, "acme ltda", 1_500.0, Some((2024, 3, 3))),
            tx(3, "Zenith Corp", 1_500.0, Some((2024, 3, 2))),
            tx(4, "Other Vendor", 700.0, Some((2024, 3, 1))),
        ];

        let groups = engine.find_duplicates(&transactions);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].transactions.len(), 2);
        let ids: Vec<i64> = groups[0].transactions.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(groups[0].amount, 1_500.0);
    }

    #[test]
    fn test_date_window_excludes_distant_pairs() {
        let engine = DuplicateEngine::new();
        let transactions = vec![
            tx(1, "ACME Ltda", 900.0, Some((2024, 1, 1))),
            tx(2, "ACME Ltda", 900.0, Some((2024, 2, 15))),
        ];

        let groups = engine.find_duplicates(&transactions);
        assert!(groups.is_empty(), "45 days apart must not match");
    }

    #[test]
    fn test_missing_dates_fall_back_to_name_match() {
        let engine = DuplicateEngine::new();
        let transactions = vec![
            tx(1, "ACME Ltda", 900.0, None),
            tx(2, "ACME Ltda", 900.0, Some((2024, 2, 15))),
        ];

        let groups = engine.find_duplicates(&transactions);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_zero_amounts_skipped() {
        let engine = DuplicateEngine::new();
        let transactions = vec![
            tx(1, "ACME", 0.0, None),
            tx(2, "ACME", 0.0, None),
        ];

        assert!(engine.find_duplicates(&transactions).is_empty());
    }

    #[test]
    fn test_same_amount_different_vendor_not_grouped() {
        let engine = DuplicateEngine::new();
        let transactions = vec![
            tx(1, "Alpha Services", 2_000.0, Some((2024, 5, 1))),
            tx(2, "Beta Industrial", 2_000.0, Some((2024, 5, 1))),
        ];

        assert!(engine.find_duplicates(&transactions).is_empty());
    }
}
