// 🎯 Materiality Engine - PM / TE / CTT thresholds (NBC TA 320)
// Benchmark selection is entity-type driven; risk tightens the percentage,
// never loosens it.

use crate::aggregation::FinancialSummary;
use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};

/// Clearly-trivial threshold is a fixed 5% of PM. Not user-configurable:
/// it is the defensive floor below which misstatements are never tracked.
pub const TRIVIAL_RATIO: f64 = 0.05;

// ============================================================================
// ENTITY TYPE & BENCHMARK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    /// Profit-oriented entity (Empresarial).
    Commercial,
    /// Condominium (Condominial) - audited against its expense base.
    Condominium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Benchmark {
    GrossRevenue,
    TotalAssets,
    NetProfit,
    Equity,
    TotalExpenses,
}

impl Benchmark {
    pub fn name(&self) -> &str {
        match self {
            Benchmark::GrossRevenue => "gross_revenue",
            Benchmark::TotalAssets => "total_assets",
            Benchmark::NetProfit => "net_profit",
            Benchmark::Equity => "equity",
            Benchmark::TotalExpenses => "total_expenses",
        }
    }
}

/// Industry-convention percentage range for one benchmark.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BenchmarkPolicy {
    pub benchmark: Benchmark,
    /// Percentage bounds, e.g. (0.5, 1.0) for 0.5%-1% of revenue.
    pub min_pct: f64,
    pub max_pct: f64,
    pub label: &'static str,
}

/// Commercial benchmark table, in suggestion preference order.
pub const BENCHMARKS_COMMERCIAL: [BenchmarkPolicy; 4] = [
    BenchmarkPolicy {
        benchmark: Benchmark::NetProfit,
        min_pct: 5.0,
        max_pct: 10.0,
        label: "5% a 10% do Lucro Líquido",
    },
    BenchmarkPolicy {
        benchmark: Benchmark::GrossRevenue,
        min_pct: 0.5,
        max_pct: 1.0,
        label: "0.5% a 1% da Receita Bruta",
    },
    BenchmarkPolicy {
        benchmark: Benchmark::TotalAssets,
        min_pct: 1.0,
        max_pct: 2.0,
        label: "1% a 2% do Ativo Total",
    },
    BenchmarkPolicy {
        benchmark: Benchmark::Equity,
        min_pct: 1.0,
        max_pct: 5.0,
        label: "1% a 5% do Patrimônio Líquido",
    },
];

/// Condominium benchmark table: expenses first, then collections.
pub const BENCHMARKS_CONDOMINIUM: [BenchmarkPolicy; 2] = [
    BenchmarkPolicy {
        benchmark: Benchmark::TotalExpenses,
        min_pct: 1.0,
        max_pct: 3.0,
        label: "1% a 3% das Despesas Totais",
    },
    BenchmarkPolicy {
        benchmark: Benchmark::GrossRevenue,
        min_pct: 0.5,
        max_pct: 1.0,
        label: "0.5% a 1% da Arrecadação Total",
    },
];

// ============================================================================
// RISK FACTORS
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskFactor {
    pub id: &'static str,
    pub label: &'static str,
    pub weight: u32,
}

/// Qualitative inherent/control risk factors and their weights.
pub const RISK_FACTORS: [RiskFactor; 6] = [
    RiskFactor { id: "new_client", label: "Primeira Auditoria (Cliente Novo)", weight: 2 },
    RiskFactor { id: "control_failures", label: "Falhas Relevantes de Controle Interno", weight: 2 },
    RiskFactor { id: "history_errors", label: "Histórico de Ajustes/Erros", weight: 1 },
    RiskFactor { id: "volatile_env", label: "Ambiente Econômico Volátil / Mudanças", weight: 1 },
    RiskFactor { id: "public_interest", label: "Entidade de Interesse Público", weight: 1 },
    RiskFactor { id: "fraud_risk", label: "Indicadores de Risco de Fraude", weight: 3 },
];

/// Sum the weights of the selected risk factor ids. Unknown ids are ignored.
pub fn risk_score(risks_identified: &[String]) -> u32 {
    RISK_FACTORS
        .iter()
        .filter(|f| risks_identified.iter().any(|id| id == f.id))
        .map(|f| f.weight)
        .sum()
}

// ============================================================================
// RISK ADJUSTMENT
// ============================================================================

/// Maps a risk score to a point inside a benchmark's percentage range.
///
/// Stepped tiers: low risk takes the top of the range, medium the midpoint,
/// high the bottom. The tier cutoffs are parameters because the exact curve
/// is a firm policy choice; any configuration stays monotonic (higher score
/// never yields a higher percentage).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskAdjustment {
    /// Scores up to this take the maximum percentage.
    pub low_risk_max: u32,
    /// Scores up to this take the midpoint; above it, the minimum.
    pub medium_risk_max: u32,
}

impl RiskAdjustment {
    pub fn recommended_pct(&self, policy: &BenchmarkPolicy, score: u32) -> f64 {
        if score <= self.low_risk_max {
            policy.max_pct
        } else if score <= self.medium_risk_max {
            (policy.min_pct + policy.max_pct) / 2.0
        } else {
            policy.min_pct
        }
    }

    /// Performance materiality percentage for a risk score (85 / 75 / 60).
    pub fn performance_pct(&self, score: u32) -> f64 {
        if score <= self.low_risk_max {
            85.0
        } else if score <= self.medium_risk_max {
            75.0
        } else {
            60.0
        }
    }
}

impl Default for RiskAdjustment {
    fn default() -> Self {
        RiskAdjustment {
            low_risk_max: 1,
            medium_risk_max: 4,
        }
    }
}

// ============================================================================
// THRESHOLDS & MATERIALITY SET
// ============================================================================

/// The three thresholds derived from one benchmark figure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaterialityThresholds {
    /// Global (planning) materiality.
    pub pm: f64,
    /// Performance materiality; always <= pm.
    pub te: f64,
    /// Clearly trivial threshold; exactly 5% of pm.
    pub ctt: f64,
}

/// Full engagement materiality record. Superseded on re-save (append-only
/// history in the store), never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialitySet {
    pub benchmark: Benchmark,
    pub benchmark_value: f64,
    pub pct_global: f64,
    pub pct_performance: f64,
    pub pm: f64,
    pub te: f64,
    pub ctt: f64,
    pub risk_score: u32,
    pub risks_identified: Vec<String>,
}

/// Benchmark suggestion for the planning wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSuggestion {
    pub benchmark: Benchmark,
    pub base_value: f64,
    pub recommended_pct: f64,
    pub risk_score: u32,
    pub label: String,
}

// ============================================================================
// MATERIALITY ENGINE
// ============================================================================

pub struct MaterialityEngine {
    pub risk_adjustment: RiskAdjustment,
}

impl MaterialityEngine {
    pub fn new() -> Self {
        MaterialityEngine {
            risk_adjustment: RiskAdjustment::default(),
        }
    }

    pub fn with_risk_adjustment(risk_adjustment: RiskAdjustment) -> Self {
        MaterialityEngine { risk_adjustment }
    }

    /// Suggest the most appropriate benchmark for the entity type.
    ///
    /// Condominiums prefer the expense base; commercial entities prefer a
    /// positive net profit, then revenue, then assets. Fails with
    /// `NoMappedData` when no benchmark figure is usable.
    pub fn suggest(
        &self,
        entity_type: EntityType,
        financials: &FinancialSummary,
        risks_identified: &[String],
    ) -> Result<BenchmarkSuggestion> {
        let score = risk_score(risks_identified);

        let table: &[BenchmarkPolicy] = match entity_type {
            EntityType::Commercial => &BENCHMARKS_COMMERCIAL,
            EntityType::Condominium => &BENCHMARKS_CONDOMINIUM,
        };

        for policy in table {
            let base_value = financials.benchmark_value(policy.benchmark);
            if base_value > 0.0 {
                return Ok(BenchmarkSuggestion {
                    benchmark: policy.benchmark,
                    base_value,
                    recommended_pct: self.risk_adjustment.recommended_pct(policy, score),
                    risk_score: score,
                    label: policy.label.to_string(),
                });
            }
        }

        Err(AuditError::NoMappedData)
    }

    /// Derive PM / TE / CTT from a benchmark value and percentages.
    pub fn calculate(
        &self,
        benchmark_value: f64,
        pct_global: f64,
        pct_performance: f64,
    ) -> Result<MaterialityThresholds> {
        if benchmark_value <= 0.0 {
            return Err(AuditError::InvalidBenchmark {
                value: benchmark_value,
            });
        }
        if pct_global <= 0.0 || pct_global > 100.0 {
            return Err(AuditError::InvalidPercentage {
                field: "pct_global",
                value: pct_global,
            });
        }
        if pct_performance <= 0.0 || pct_performance > 100.0 {
            return Err(AuditError::InvalidPercentage {
                field: "pct_performance",
                value: pct_performance,
            });
        }

        let pm = benchmark_value * pct_global / 100.0;
        let te = pm * pct_performance / 100.0;
        let ctt = pm * TRIVIAL_RATIO;

        Ok(MaterialityThresholds { pm, te, ctt })
    }

    /// Build the full engagement record from a suggestion and percentages.
    pub fn build_set(
        &self,
        suggestion: &BenchmarkSuggestion,
        pct_global: f64,
        pct_performance: f64,
        risks_identified: Vec<String>,
    ) -> Result<MaterialitySet> {
        let thresholds = self.calculate(suggestion.base_value, pct_global, pct_performance)?;

        Ok(MaterialitySet {
            benchmark: suggestion.benchmark,
            benchmark_value: suggestion.base_value,
            pct_global,
            pct_performance,
            pm: thresholds.pm,
            te: thresholds.te,
            ctt: thresholds.ctt,
            risk_score: suggestion.risk_score,
            risks_identified,
        })
    }
}

impl Default for MaterialityEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Round a materiality figure to a clean presentation value
/// (nearest 10 below 1k, nearest 100 below 10k, nearest 1000 above).
pub fn round_to_clean_value(value: f64) -> f64 {
    let unit = if value < 1_000.0 {
        10.0
    } else if value < 10_000.0 {
        100.0
    } else {
        1_000.0
    };
    (value / unit).round() * unit
}
