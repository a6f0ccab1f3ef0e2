// ⚖️ Payroll Reconciliation - Payroll system totals vs. the ledger
// Compares the gross figure reported by the payroll system against the
// payroll expense recognized in accounting.

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ledger::Transaction;

// ============================================================================
// PAYROLL DATA
// ============================================================================

/// One employee row from the payroll summary CSV.
/// Headers: `code,name,gross_salary,inss,fgts,net_pay`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRow {
    pub code: String,
    pub name: String,
    pub gross_salary: f64,
    pub inss: f64,
    pub fgts: f64,
    pub net_pay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollSummary {
    pub total_gross: f64,
    pub total_inss: f64,
    pub total_fgts: f64,
    pub employee_count: usize,
}

impl PayrollSummary {
    pub fn from_rows(rows: &[PayrollRow]) -> Self {
        PayrollSummary {
            total_gross: rows.iter().map(|r| r.gross_salary).sum(),
            total_inss: rows.iter().map(|r| r.inss).sum(),
            total_fgts: rows.iter().map(|r| r.fgts).sum(),
            employee_count: rows.len(),
        }
    }
}

/// Load a payroll summary CSV.
pub fn load_payroll(csv_path: &Path) -> AnyResult<Vec<PayrollRow>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open payroll CSV")?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: PayrollRow = result.context("Failed to deserialize payroll row")?;
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// LEDGER SIDE
// ============================================================================

const PAYROLL_KEYWORDS: [&str; 7] = [
    "pessoal",
    "salario",
    "ordenado",
    "inss",
    "fgts",
    "folha",
    "trabalhista",
];

/// Sum of ledger transactions that look payroll-related by vendor/description
/// keyword. Fallback figure for when account mapping is incomplete.
pub fn payroll_expense_total(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| {
            let vendor = tx.vendor.to_lowercase();
            PAYROLL_KEYWORDS.iter().any(|kw| vendor.contains(kw))
        })
        .map(|tx| tx.amount)
        .sum()
}

// ============================================================================
// RECONCILIATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    #[serde(rename = "reconciled")]
    Reconciled,
    #[serde(rename = "divergent")]
    Divergent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollReconciliation {
    pub payroll_system_gross: f64,
    pub payroll_system_inss: f64,
    pub payroll_system_fgts: f64,
    pub accounting_total: f64,

    /// accounting_total - (gross + inss + fgts)
    pub difference: f64,

    pub status: ReconciliationStatus,
}

pub struct PayrollReconciliationEngine {
    /// Absolute difference between accounting and gross payroll tolerated
    /// before the result is marked divergent.
    pub tolerance: f64,
}

impl PayrollReconciliationEngine {
    pub fn new() -> Self {
        PayrollReconciliationEngine { tolerance: 100.0 }
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        PayrollReconciliationEngine { tolerance }
    }

    /// Compare payroll system totals against the accounting-side total.
    pub fn reconcile(
        &self,
        summary: &PayrollSummary,
        accounting_total: f64,
    ) -> PayrollReconciliation {
        let charges = summary.total_gross + summary.total_inss + summary.total_fgts;
        let status = if (accounting_total - summary.total_gross).abs() > self.tolerance {
            ReconciliationStatus::Divergent
        } else {
            ReconciliationStatus::Reconciled
        };

        PayrollReconciliation {
            payroll_system_gross: summary.total_gross,
            payroll_system_inss: summary.total_inss,
            payroll_system_fgts: summary.total_fgts,
            accounting_total,
            difference: accounting_total - charges,
            status,
        }
    }
}

impl Default for PayrollReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<PayrollRow> {
        vec![
            PayrollRow {
                code: "001".to_string(),
                name: "Maria".to_string(),
                gross_salary: 8_000.0,
                inss: 880.0,
                fgts: 640.0,
                net_pay: 6_500.0,
            },
            PayrollRow {
                code: "002".to_string(),
                name: "João".to_string(),
                gross_salary: 5_000.0,
                inss: 550.0,
                fgts: 400.0,
                net_pay: 4_100.0,
            },
        ]
    }

    #[test]
    fn test_summary_from_rows() {
        let summary = PayrollSummary::from_rows(&rows());
        assert_eq!(summary.total_gross, 13_000.0);
        assert_eq!(summary.total_inss, 1_430.0);
        assert_eq!(summary.total_fgts, 1_040.0);
        assert_eq!(summary.employee_count, 2);
    }

    #[test]
    fn test_reconciled_within_tolerance() {
        let engine = PayrollReconciliationEngine::new();
        let summary = PayrollSummary::from_rows(&rows());

        let result = engine.reconcile(&summary, 13_050.0);
        assert_eq!(result.status, ReconciliationStatus::Reconciled);
    }

    #[test]
    fn test_divergent_beyond_tolerance() {
        let engine = PayrollReconciliationEngine::new();
        let summary = PayrollSummary::from_rows(&rows());

        let result = engine.reconcile(&summary, 18_000.0);
        assert_eq!(result.status, ReconciliationStatus::Divergent);
        assert_eq!(result.difference, 18_000.0 - (13_000.0 + 1_430.0 + 1_040.0));
    }

    #[test]
    fn test_payroll_expense_total_by_keyword() {
        let transactions = vec![
            Transaction {
                id: 1,
                vendor: "FOLHA DE PAGAMENTO 03/2024".to_string(),
                amount: 13_000.0,
                date: None,
                account_code: String::new(),
            },
            Transaction {
                id: 2,
                vendor: "Recolhimento INSS".to_string(),
                amount: 1_430.0,
                date: None,
                account_code: String::new(),
            },
            Transaction {
                id: 3,
                vendor: "Aluguel Sede".to_string(),
                amount: 4_000.0,
                date: None,
                account_code: String::new(),
            },
        ];

        assert_eq!(payroll_expense_total(&transactions), 14_430.0);
    }
}
