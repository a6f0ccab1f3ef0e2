// 🎲 Sampling Engine - Statistical selections (NBC TA 530)
// Two interchangeable strategies: simple random and value-stratified.
// Every run records its seed and a population digest so the selection can be
// reproduced and audited later.

use crate::error::{AuditError, Result};
use crate::ledger::Transaction;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// SAMPLE RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleMethod {
    #[serde(rename = "random")]
    Random,
    #[serde(rename = "stratified")]
    Stratified,
}

/// Why an item entered the sample. Labels match the reporting contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionReason {
    #[serde(rename = "High Value")]
    HighValue,
    #[serde(rename = "Random")]
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampledItem {
    pub transaction: Transaction,
    pub reason: SelectionReason,
}

/// Output of one sampling run. Never mutated; re-creatable from the same
/// population and the recorded seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResult {
    pub method: SampleMethod,
    pub population_size: usize,
    pub sample_size: usize,
    pub items: Vec<SampledItem>,

    /// Stratified only: size of the 100%-covered high-value stratum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_value_count: Option<usize>,

    /// Set when the below-threshold remainder was smaller than requested.
    pub short_sample: bool,

    /// Seed actually used (recorded even when the caller omitted one).
    pub seed: u64,

    /// SHA-256 over (id, amount) of the population in input order.
    pub population_digest: String,
}

// ============================================================================
// SAMPLING ENGINE
// ============================================================================

pub struct SamplingEngine;

impl SamplingEngine {
    pub fn new() -> Self {
        SamplingEngine
    }

    /// Draw `n` distinct items uniformly without replacement.
    ///
    /// Fails with `InsufficientPopulation` when `n` exceeds the population -
    /// a short sample is never returned silently. Pass a seed to reproduce a
    /// prior selection; omitting it draws a fresh one (still recorded in the
    /// result).
    pub fn random_sample(
        &self,
        population: &[Transaction],
        n: usize,
        seed: Option<u64>,
    ) -> Result<SampleResult> {
        if n > population.len() {
            return Err(AuditError::InsufficientPopulation {
                requested: n,
                available: population.len(),
            });
        }

        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut items = draw(population, n, &mut rng, SelectionReason::Random);
        sort_by_id(&mut items);

        Ok(SampleResult {
            method: SampleMethod::Random,
            population_size: population.len(),
            sample_size: items.len(),
            items,
            high_value_count: None,
            short_sample: false,
            seed,
            population_digest: population_digest(population),
        })
    }

    /// Full coverage of the high-value stratum plus a random slice of the rest.
    ///
    /// Every item with `|amount| >= threshold` is selected deterministically;
    /// the below-threshold remainder is randomly sampled for `n_below` items.
    /// A remainder smaller than `n_below` is taken whole and flagged via
    /// `short_sample` - under-sampling a small remainder is acceptable.
    pub fn stratified_sample(
        &self,
        population: &[Transaction],
        threshold: f64,
        n_below: usize,
        seed: Option<u64>,
    ) -> Result<SampleResult> {
        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let (high, low): (Vec<&Transaction>, Vec<&Transaction>) = population
            .iter()
            .partition(|tx| tx.amount.abs() >= threshold);

        let high_value_count = high.len();
        let short_sample = n_below > low.len();
        let take_below = n_below.min(low.len());

        let mut high_items: Vec<SampledItem> = high
            .into_iter()
            .map(|tx| SampledItem {
                transaction: tx.clone(),
                reason: SelectionReason::HighValue,
            })
            .collect();
        sort_by_id(&mut high_items);

        let low_owned: Vec<Transaction> = low.into_iter().cloned().collect();
        let mut low_items = draw(&low_owned, take_below, &mut rng, SelectionReason::Random);
        sort_by_id(&mut low_items);

        let mut items = high_items;
        items.append(&mut low_items);

        Ok(SampleResult {
            method: SampleMethod::Stratified,
            population_size: population.len(),
            sample_size: items.len(),
            items,
            high_value_count: Some(high_value_count),
            short_sample,
            seed,
            population_digest: population_digest(population),
        })
    }
}

impl Default for SamplingEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn draw(
    population: &[Transaction],
    n: usize,
    rng: &mut StdRng,
    reason: SelectionReason,
) -> Vec<SampledItem> {
    rand::seq::index::sample(rng, population.len(), n)
        .into_iter()
        .map(|i| SampledItem {
            transaction: population[i].clone(),
            reason,
        })
        .collect()
}

// Stable ordering so repeated exports of the same result are byte-identical.
fn sort_by_id(items: &mut [SampledItem]) {
    items.sort_by_key(|item| item.transaction.id);
}

fn population_digest(population: &[Transaction]) -> String {
    let mut hasher = Sha256::new();
    for tx in population {
        hasher.update(format!("{}:{}", tx.id, tx.amount));
    }
    format!("{:x}", hasher.finalize())
}
