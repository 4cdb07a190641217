use actuary_core::{
    ActuaryConfig, ConsensusPredictionRecord, DivergenceMetrics, Oracle, OracleFeed,
};
use serde::Serialize;

pub struct ConsensusCommandConfig<'a> {
    pub config: &'a ActuaryConfig,
    pub market_data: Option<&'a str>,
    pub cycles: usize,
    pub actual: Option<f64>,
    pub seed: Option<u64>,
    pub dim: usize,
    pub output_path: Option<&'a str>,
}

#[derive(Serialize)]
struct ConsensusRun {
    records: Vec<ConsensusPredictionRecord>,
    divergence: DivergenceMetrics,
    oracles: Vec<Oracle>,
}

pub fn run(cmd: ConsensusCommandConfig) {
    let mut feed_config = cmd.config.oracle.clone();
    if cmd.seed.is_some() {
        feed_config.seed = cmd.seed;
    }
    let feed = OracleFeed::new(feed_config).unwrap_or_else(|e| super::fail(e));
    let market_data = super::resolve_vector(cmd.market_data, cmd.seed, cmd.dim, "market-data");

    println!(
        "Oracle consensus: {} oracles, {} cycle(s)\n",
        feed.config().n_oracles,
        cmd.cycles
    );
    println!(
        "  {:>5} {:>12} {:>14} {:>10}",
        "Cycle", "Consensus", "Divergence %", "Time ms"
    );
    println!("  {}", "-".repeat(44));

    for cycle in 1..=cmd.cycles.max(1) {
        let record = feed.predict(&market_data).unwrap_or_else(|e| super::fail(e));
        println!(
            "  {:>5} {:>12.6} {:>14.4} {:>10.3}",
            cycle, record.consensus_prediction, record.divergence_percent, record.cycle_duration_ms
        );
        if let Some(actual) = cmd.actual {
            feed.update_accuracy(actual).unwrap_or_else(|e| super::fail(e));
        }
    }

    let divergence = feed.get_divergence_metrics();
    println!(
        "\n  Divergence: mean {:.4}%, median {:.4}%, p95 {:.4}%, within target {:.1}%",
        divergence.mean,
        divergence.median,
        divergence.p95,
        divergence.within_target_ratio * 100.0
    );

    super::write_report(
        cmd.output_path,
        "consensus",
        ConsensusRun {
            records: feed.history(),
            divergence,
            oracles: feed.oracles(),
        },
    );
}
