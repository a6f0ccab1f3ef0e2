// 📊 Financial Aggregator - Trial balance → benchmark figures
// Pure reduction: mapped rows in, four named benchmark totals out.

use crate::error::{AuditError, Result};
use crate::ledger::{AccountType, MappedRow};
use crate::materiality::Benchmark;
use serde::{Deserialize, Serialize};

// ============================================================================
// FINANCIAL SUMMARY
// ============================================================================

/// Benchmark figures reduced from a mapped trial balance.
///
/// Each figure is the absolute value of the summed mapped balances for that
/// type, so credit-natured accounts (revenue, equity) come out non-negative.
/// A zero figure means "no rows mapped to this type" - callers must treat it
/// as unavailable, never as "materiality is zero".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub revenue: f64,
    pub assets: f64,
    pub liabilities: f64,
    pub equity: f64,
    pub expenses: f64,

    /// revenue - expenses; negative for loss-makers.
    pub net_profit: f64,

    /// Per-account detail for the reporting layer.
    pub details: Vec<SummaryDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDetail {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub balance: f64,
}

impl FinancialSummary {
    /// Figure backing a given materiality benchmark.
    pub fn benchmark_value(&self, benchmark: Benchmark) -> f64 {
        match benchmark {
            Benchmark::GrossRevenue => self.revenue,
            Benchmark::TotalAssets => self.assets,
            Benchmark::NetProfit => self.net_profit,
            Benchmark::Equity => self.equity,
            Benchmark::TotalExpenses => self.expenses,
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Reduce a mapped trial balance into benchmark figures.
///
/// Fails with `NoMappedData` when there is nothing to reduce, so the caller
/// can prompt for account mapping instead of computing on an empty base.
pub fn aggregate(rows: &[MappedRow]) -> Result<FinancialSummary> {
    if rows.is_empty() {
        return Err(AuditError::NoMappedData);
    }

    let mut revenue = 0.0;
    let mut assets = 0.0;
    let mut liabilities = 0.0;
    let mut equity = 0.0;
    let mut expenses = 0.0;
    let mut details = Vec::with_capacity(rows.len());

    for row in rows {
        match row.account_type {
            AccountType::Revenue => revenue += row.balance,
            AccountType::Asset => assets += row.balance,
            AccountType::Liability => liabilities += row.balance,
            AccountType::Equity => equity += row.balance,
            AccountType::Expense => expenses += row.balance,
        }

        details.push(SummaryDetail {
            account_code: row.account_code.clone(),
            account_name: row.account_name.clone(),
            account_type: row.account_type,
            balance: row.balance,
        });
    }

    let revenue = revenue.abs();
    let assets = assets.abs();
    let liabilities = liabilities.abs();
    let equity = equity.abs();
    let expenses = expenses.abs();

    Ok(FinancialSummary {
        revenue,
        assets,
        liabilities,
        equity,
        expenses,
        net_profit: revenue - expenses,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, account_type: AccountType, balance: f64) -> MappedRow {
        MappedRow {
            account_code: code.to_string(),
            account_name: format!("Account {}", code),
            account_type,
            balance,
        }
    }

    #[test]
    fn test_aggregate_sums_per_type() {
        let rows = vec![
            row("1.1", AccountType::Asset, 300_000.0),
            row("1.2", AccountType::Asset, 200_000.0),
            row("3.1", AccountType::Revenue, -800_000.0),
            row("4.1", AccountType::Expense, 650_000.0),
            row("2.3", AccountType::Equity, -150_000.0),
        ];

        let summary = aggregate(&rows).unwrap();
        assert_eq!(summary.assets, 500_000.0);
        assert_eq!(summary.revenue, 800_000.0);
        assert_eq!(summary.expenses, 650_000.0);
        assert_eq!(summary.equity, 150_000.0);
        assert_eq!(summary.net_profit, 150_000.0);
        assert_eq!(summary.details.len(), 5);
    }

    #[test]
    fn test_aggregate_missing_type_is_zero_not_error() {
        let rows = vec![row("3.1", AccountType::Revenue, -100_000.0)];

        let summary = aggregate(&rows).unwrap();
        assert_eq!(summary.revenue, 100_000.0);
        assert_eq!(summary.assets, 0.0);
        assert_eq!(summary.equity, 0.0);
    }

    #[test]
    fn test_aggregate_empty_fails_with_no_mapped_data() {
        assert!(matches!(aggregate(&[]), Err(AuditError::NoMappedData)));
    }

    #[test]
    fn test_benchmark_value_accessor() {
        let rows = vec![
            row("3.1", AccountType::Revenue, -400_000.0),
            row("4.1", AccountType::Expense, 300_000.0),
        ];
        let summary = aggregate(&rows).unwrap();

        assert_eq!(summary.benchmark_value(Benchmark::GrossRevenue), 400_000.0);
        assert_eq!(summary.benchmark_value(Benchmark::TotalExpenses), 300_000.0);
        assert_eq!(summary.benchmark_value(Benchmark::NetProfit), 100_000.0);
    }
}
