use actuary_core::{ActuaryConfig, PredictiveModel};

pub fn run(
    config: &ActuaryConfig,
    features: Option<&str>,
    seed: Option<u64>,
    dim: usize,
    output_path: Option<&str>,
) {
    let mut model_config = config.model.clone();
    if seed.is_some() {
        model_config.seed = seed;
    }
    let model = PredictiveModel::new(model_config).unwrap_or_else(|e| super::fail(e));
    let features = super::resolve_vector(features, seed, dim, "features");
    let prediction = model.predict(&features).unwrap_or_else(|e| super::fail(e));

    println!(
        "Statevector prediction ({} qubits, depth {})\n",
        model.config().n_qubits,
        model.config().circuit_depth
    );
    println!("  Prediction:        {:.6}", prediction.prediction);
    println!("  Coherence:         {:.6}", prediction.coherence);
    println!("  Quantum advantage: {:.6}", prediction.quantum_advantage);
    println!("  Confidence:        {:.6}", prediction.confidence);
    println!("\n  Top basis states:");
    for state in prediction.measured_states.iter().take(5) {
        println!("    |{}>  {:.6}", state.state, state.probability);
    }

    super::write_report(output_path, "prediction", &prediction);
}
