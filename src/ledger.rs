// 📒 Ledger Model - Transactions and mapped trial-balance rows
// Core records are immutable once ingested; amount sign is preserved.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

/// Standard chart-of-accounts classification assigned by the mapping service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn name(&self) -> &str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Revenue => "Revenue",
            AccountType::Expense => "Expense",
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// A single ledger transaction. Read-only within the core once imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,

    pub vendor: String,

    /// Signed amount; debits/credits keep their original sign.
    pub amount: f64,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub account_code: String,
}

// ============================================================================
// TRIAL BALANCE
// ============================================================================

/// One mapped trial-balance row (account tagged with a standard type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedRow {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub balance: f64,
}

/// Per-account balance derived from the ledger; input to scoping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub balance: f64,
}

impl From<MappedRow> for AccountBalance {
    fn from(row: MappedRow) -> Self {
        AccountBalance {
            account_code: row.account_code,
            account_name: row.account_name,
            account_type: row.account_type,
            balance: row.balance,
        }
    }
}

// ============================================================================
// CSV LOADERS
// ============================================================================

/// Load transactions from a CSV with headers `id,vendor,amount,date,account_code`.
pub fn load_transactions(csv_path: &Path) -> Result<Vec<Transaction>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open transactions CSV")?;

    let mut transactions = Vec::new();
    for result in rdr.deserialize() {
        let tx: Transaction = result.context("Failed to deserialize transaction row")?;
        transactions.push(tx);
    }

    Ok(transactions)
}

/// Load a mapped trial balance from a CSV with headers
/// `account_code,account_name,account_type,balance`.
pub fn load_trial_balance(csv_path: &Path) -> Result<Vec<MappedRow>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open trial balance CSV")?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: MappedRow = result.context("Failed to deserialize trial balance row")?;
        rows.push(row);
    }

    Ok(rows)
}
