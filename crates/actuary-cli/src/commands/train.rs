use actuary_core::{ActuaryConfig, PredictiveModel, QuantumPrediction, RotationGate, TrainingRecord};
use serde::Serialize;

pub struct TrainCommandConfig<'a> {
    pub config: &'a ActuaryConfig,
    pub features: Option<&'a str>,
    pub target: f64,
    pub epochs: usize,
    pub rotation: Option<&'a str>,
    pub seed: Option<u64>,
    pub dim: usize,
    pub output_path: Option<&'a str>,
}

#[derive(Serialize)]
struct TrainingRun {
    target: f64,
    epoch_losses: Vec<f64>,
    final_prediction: QuantumPrediction,
    params: Vec<f64>,
    history: Vec<TrainingRecord>,
}

pub fn run(cmd: TrainCommandConfig) {
    let mut model_config = cmd.config.model.clone();
    if cmd.seed.is_some() {
        model_config.seed = cmd.seed;
    }
    match cmd.rotation {
        Some("ry") => model_config.rotation = RotationGate::Ry,
        Some("phase") => model_config.rotation = RotationGate::Phase,
        _ => {}
    }
    if model_config.rotation == RotationGate::Phase {
        eprintln!("Note: phase rotations do not change measured probabilities; use --rotation ry for a non-zero gradient");
    }

    let mut model = PredictiveModel::new(model_config).unwrap_or_else(|e| super::fail(e));
    let features = super::resolve_vector(cmd.features, cmd.seed, cmd.dim, "features");

    println!(
        "Training {} parameters for {} epochs toward {:.4}\n",
        model.params().len(),
        cmd.epochs,
        cmd.target
    );
    let epoch_losses = model
        .fit(&[(features.clone(), cmd.target)], cmd.epochs)
        .unwrap_or_else(|e| super::fail(e));
    for (i, loss) in epoch_losses.iter().enumerate() {
        println!("  epoch {:>4}  loss {:.6e}", i + 1, loss);
    }

    let final_prediction = model.predict(&features).unwrap_or_else(|e| super::fail(e));
    println!(
        "\n  Final prediction: {:.6} (target {:.6})",
        final_prediction.prediction, cmd.target
    );

    super::write_report(
        cmd.output_path,
        "training",
        TrainingRun {
            target: cmd.target,
            epoch_losses,
            final_prediction,
            params: model.params().to_vec(),
            history: model.training_history(),
        },
    );
}
