// AuditFlow Core - Quantitative risk-assessment engines for audit planning
// Exposes all modules for use in the CLI and tests

pub mod error;
pub mod ledger;
pub mod aggregation;   // Financial Aggregator - trial balance → benchmarks
pub mod materiality;   // Materiality Engine - PM / TE / CTT (NBC TA 320)
pub mod scoping;       // Risk Matrix - account classification vs. materiality
pub mod sampling;      // Sampling Engine - random + stratified (NBC TA 530)
pub mod benford;       // Benford Analyzer - leading-digit anomalies
pub mod duplicates;    // Duplicate payment detection
pub mod payroll;       // Payroll reconciliation vs. ledger
pub mod store;         // Append-only analysis result history (SQLite)

// Re-export commonly used types
pub use error::{AuditError, Result};
pub use ledger::{
    AccountBalance, AccountType, MappedRow, Transaction,
    load_transactions, load_trial_balance,
};
pub use aggregation::{aggregate, FinancialSummary, SummaryDetail};
pub use materiality::{
    Benchmark, BenchmarkPolicy, BenchmarkSuggestion, EntityType, MaterialityEngine,
    MaterialitySet, MaterialityThresholds, RiskAdjustment, RiskFactor,
    risk_score, round_to_clean_value, RISK_FACTORS, TRIVIAL_RATIO,
};
pub use scoping::{
    classify, merge_overrides, Classification, RiskLevel, ScopingEntry, TestStrategy,
};
pub use sampling::{
    SampleMethod, SampleResult, SampledItem, SamplingEngine, SelectionReason,
};
pub use benford::{BenfordAnalyzer, BenfordResult, DigitDetail, ANOMALY_THRESHOLD};
pub use duplicates::{token_sort_similarity, DuplicateEngine, DuplicateGroup};
pub use payroll::{
    load_payroll, payroll_expense_total, PayrollReconciliation,
    PayrollReconciliationEngine, PayrollRow, PayrollSummary, ReconciliationStatus,
};
pub use store::{
    get_results, get_scoping_entries, insert_result, latest_result, setup_database,
    upsert_scoping_entries, AnalysisRecord, TestType,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
