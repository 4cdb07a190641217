use actuary_core::{ActuaryConfig, ActuaryCore, ActuaryInput, Scenario};

pub fn run(mut config: ActuaryConfig, seed: Option<u64>, scenario: &str, output_path: Option<&str>) {
    let scenario: Scenario = scenario.parse().unwrap_or_else(|e| super::fail(e));
    let seed = seed.unwrap_or_else(rand::random);
    config.model.seed.get_or_insert(seed);
    config.oracle.seed.get_or_insert(seed);

    let tensor_len = config.harmonics.tensor_len;
    let feature_len = 1usize << config.model.n_qubits;
    let core = ActuaryCore::new(config).unwrap_or_else(|e| super::fail(e));
    let input = ActuaryInput {
        risk_tensor: super::generate_vector(tensor_len, seed),
        features: super::generate_vector(feature_len, seed.wrapping_add(1)),
        market_data: super::generate_vector(8, seed.wrapping_add(2)),
        metrics: scenario.metrics(),
    };
    let assessment = core.evaluate(&input).unwrap_or_else(|e| super::fail(e));

    println!("Actuary pipeline (seed {seed}, {} preset)\n", scenario.name());
    println!(
        "  Risk score:          {:.2} ({})",
        assessment.harmonics.aggregate.total_risk_score, assessment.harmonics.aggregate.risk_level
    );
    println!("  Model prediction:    {:.6}", assessment.prediction.prediction);
    println!(
        "  Oracle consensus:    {:.6} (divergence {:.4}%)",
        assessment.consensus.consensus_prediction, assessment.consensus.divergence_percent
    );
    println!("  Blended risk:        {:.6}", assessment.blended_risk);
    println!(
        "  Risk adjustment:     {:.4} -> {:.4}\n",
        input.metrics.risk_adjustment, assessment.effective_risk_adjustment
    );
    super::project::print_projection(&assessment.projection);

    super::write_report(output_path, "assessment", &assessment);
}
