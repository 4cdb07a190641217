use actuary_core::{ActuaryConfig, RiskCategory, TensorHarmonicsProcessor};

pub fn run(config: &ActuaryConfig, tensor: Option<&str>, seed: Option<u64>, output_path: Option<&str>) {
    let processor =
        TensorHarmonicsProcessor::new(config.harmonics.clone()).unwrap_or_else(|e| super::fail(e));
    let tensor = super::resolve_vector(tensor, seed, config.harmonics.tensor_len, "tensor");
    let report = processor.process(&tensor).unwrap_or_else(|e| super::fail(e));

    println!("Risk tensor harmonics ({} values)\n", tensor.len());
    println!(
        "  {:<12} {:>12} {:>9} {:>9}",
        "Category", "Energy", "Peak bin", "Entropy"
    );
    println!("  {}", "-".repeat(45));
    for category in RiskCategory::ALL {
        let h = report.harmonics.get(category);
        println!(
            "  {:<12} {:>12.4} {:>9} {:>9.4}",
            category.as_str(),
            h.spectral_energy,
            h.dominant_frequency,
            h.entropy
        );
    }
    println!(
        "\n  Total risk score: {:.2} ({})",
        report.aggregate.total_risk_score, report.aggregate.risk_level
    );

    super::write_report(output_path, "harmonics", &report);
}
