use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::env;
use std::path::Path;

use auditflow_core::{
    aggregate, classify, get_results, insert_result, load_transactions, load_trial_balance,
    merge_overrides, setup_database, AnalysisRecord, BenfordAnalyzer, DuplicateEngine,
    MaterialityEngine, SamplingEngine, TestType,
};

const DB_PATH: &str = "auditflow.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("benford") => run_benford(&args[2..]),
        Some("duplicates") => run_duplicates(&args[2..]),
        Some("sample") => run_sampling(&args[2..]),
        Some("materiality") => run_materiality(&args[2..]),
        Some("payroll") => run_payroll(&args[2..]),
        Some("history") => run_history(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("auditflow {} - audit risk-assessment core", auditflow_core::VERSION);
    println!();
    println!("Usage:");
    println!("  auditflow benford <engagement_id> <transactions.csv>");
    println!("  auditflow duplicates <engagement_id> <transactions.csv>");
    println!("  auditflow sample <engagement_id> <transactions.csv> random <n> [seed]");
    println!("  auditflow sample <engagement_id> <transactions.csv> stratified <threshold> <n_below> [seed]");
    println!("  auditflow materiality <engagement_id> <trial_balance.csv> <pct_global> <pct_performance>");
    println!("  auditflow payroll <engagement_id> <payroll.csv> <transactions.csv>");
    println!("  auditflow history <engagement_id>");
}

fn open_store() -> Result<Connection> {
    let conn = Connection::open(DB_PATH).context("Failed to open result store")?;
    setup_database(&conn)?;
    Ok(conn)
}

fn parse_engagement(args: &[String]) -> Result<i64> {
    args.first()
        .ok_or_else(|| anyhow!("missing engagement id"))?
        .parse()
        .context("engagement id must be an integer")
}

fn run_benford(args: &[String]) -> Result<()> {
    let engagement_id = parse_engagement(args)?;
    let csv_path = args.get(1).ok_or_else(|| anyhow!("missing transactions CSV path"))?;

    let transactions = load_transactions(Path::new(csv_path))?;
    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();

    let result = BenfordAnalyzer::new().analyze(&amounts)?;
    println!(
        "Benford analysis: {} usable amounts, {} anomalous digit(s): {:?}",
        result.sample_size, result.anomalies.len(), result.anomalies
    );
    for detail in &result.details {
        let marker = if detail.is_anomaly { " ⚠" } else { "" };
        println!(
            "  digit {}: expected {:.1}%, observed {:.1}%{}",
            detail.digit,
            detail.expected * 100.0,
            detail.observed * 100.0,
            marker
        );
    }

    let conn = open_store()?;
    let record = AnalysisRecord::new(engagement_id, TestType::Benford, serde_json::to_value(&result)?);
    insert_result(&conn, &record)?;
    println!("✓ Result saved ({})", record.id);

    Ok(())
}

fn run_duplicates(args: &[String]) -> Result<()> {
    let engagement_id = parse_engagement(args)?;
    let csv_path = args.get(1).ok_or_else(|| anyhow!("missing transactions CSV path"))?;

    let transactions = load_transactions(Path::new(csv_path))?;
    let groups = DuplicateEngine::new().find_duplicates(&transactions);

    println!("Duplicate analysis: {} suspicious group(s)", groups.len());
    for group in &groups {
        println!(
            "  group {}: {} transactions, {}",
            group.group_id,
            group.transactions.len(),
            group.reason
        );
    }

    let conn = open_store()?;
    let record = AnalysisRecord::new(
        engagement_id,
        TestType::Duplicates,
        serde_json::json!({ "duplicates": groups }),
    );
    insert_result(&conn, &record)?;
    println!("✓ Result saved ({})", record.id);

    Ok(())
}

fn run_sampling(args: &[String]) -> Result<()> {
    let engagement_id = parse_engagement(args)?;
    let csv_path = args.get(1).ok_or_else(|| anyhow!("missing transactions CSV path"))?;
    let mode = args.get(2).map(String::as_str).unwrap_or("random");

    let transactions = load_transactions(Path::new(csv_path))?;
    let engine = SamplingEngine::new();

    let result = match mode {
        "random" => {
            let n: usize = args
                .get(3)
                .ok_or_else(|| anyhow!("missing sample size"))?
                .parse()?;
            let seed = args.get(4).map(|s| s.parse()).transpose()?;
            engine.random_sample(&transactions, n, seed)?
        }
        "stratified" => {
            let threshold: f64 = args
                .get(3)
                .ok_or_else(|| anyhow!("missing value threshold"))?
                .parse()?;
            let n_below: usize = args
                .get(4)
                .ok_or_else(|| anyhow!("missing below-threshold sample size"))?
                .parse()?;
            let seed = args.get(5).map(|s| s.parse()).transpose()?;
            engine.stratified_sample(&transactions, threshold, n_below, seed)?
        }
        other => return Err(anyhow!("unknown sampling mode: {}", other)),
    };

    println!(
        "Sample: {} of {} items (seed {})",
        result.sample_size, result.population_size, result.seed
    );
    if let Some(high) = result.high_value_count {
        println!("  high-value stratum: {} items (100% coverage)", high);
    }
    if result.short_sample {
        println!("  note: below-threshold remainder was smaller than requested");
    }

    let conn = open_store()?;
    let record = AnalysisRecord::new(engagement_id, TestType::Sampling, serde_json::to_value(&result)?);
    insert_result(&conn, &record)?;
    println!("✓ Result saved ({})", record.id);

    Ok(())
}

fn run_materiality(args: &[String]) -> Result<()> {
    let engagement_id = parse_engagement(args)?;
    let csv_path = args.get(1).ok_or_else(|| anyhow!("missing trial balance CSV path"))?;
    let pct_global: f64 = args
        .get(2)
        .ok_or_else(|| anyhow!("missing global percentage"))?
        .parse()?;
    let pct_performance: f64 = args
        .get(3)
        .ok_or_else(|| anyhow!("missing performance percentage"))?
        .parse()?;

    let rows = load_trial_balance(Path::new(csv_path))?;
    let summary = aggregate(&rows)?;

    let engine = MaterialityEngine::new();
    let suggestion = engine.suggest(auditflow_core::EntityType::Commercial, &summary, &[])?;
    let set = engine.build_set(&suggestion, pct_global, pct_performance, Vec::new())?;

    println!("Benchmark: {} = {:.2}", set.benchmark.name(), set.benchmark_value);
    println!("  PM  = {:.2}", set.pm);
    println!("  TE  = {:.2}", set.te);
    println!("  CTT = {:.2}", set.ctt);

    let balances: Vec<auditflow_core::AccountBalance> =
        rows.into_iter().map(Into::into).collect();
    let conn = open_store()?;

    // Fold in any previously stored manual risk/strategy overrides.
    let previous = auditflow_core::get_scoping_entries(&conn, engagement_id)?;
    let entries = merge_overrides(classify(&balances, Some(&set))?, &previous);
    auditflow_core::upsert_scoping_entries(&conn, engagement_id, &entries)?;
    println!("✓ Scoping updated for {} account(s)", entries.len());

    let record = AnalysisRecord::new(engagement_id, TestType::Materiality, serde_json::to_value(&set)?);
    insert_result(&conn, &record)?;
    println!("✓ Materiality saved ({})", record.id);

    Ok(())
}

fn run_payroll(args: &[String]) -> Result<()> {
    let engagement_id = parse_engagement(args)?;
    let payroll_path = args.get(1).ok_or_else(|| anyhow!("missing payroll CSV path"))?;
    let csv_path = args.get(2).ok_or_else(|| anyhow!("missing transactions CSV path"))?;

    let rows = auditflow_core::load_payroll(Path::new(payroll_path))?;
    let summary = auditflow_core::PayrollSummary::from_rows(&rows);

    let transactions = load_transactions(Path::new(csv_path))?;
    let accounting_total = auditflow_core::payroll_expense_total(&transactions);

    let result = auditflow_core::PayrollReconciliationEngine::new()
        .reconcile(&summary, accounting_total);

    println!(
        "Payroll: system gross {:.2}, accounting {:.2}, difference {:.2} ({:?})",
        result.payroll_system_gross, result.accounting_total, result.difference, result.status
    );

    let conn = open_store()?;
    let record = AnalysisRecord::new(
        engagement_id,
        TestType::PayrollReconciliation,
        serde_json::to_value(&result)?,
    );
    insert_result(&conn, &record)?;
    println!("✓ Result saved ({})", record.id);

    Ok(())
}

fn run_history(args: &[String]) -> Result<()> {
    let engagement_id = parse_engagement(args)?;

    let conn = open_store()?;
    let results = get_results(&conn, engagement_id)?;

    println!("{} stored run(s) for engagement {}", results.len(), engagement_id);
    for record in results {
        println!(
            "  {} | {} | {}",
            record.executed_at.to_rfc3339(),
            record.test_type.as_str(),
            record.id
        );
    }

    Ok(())
}
