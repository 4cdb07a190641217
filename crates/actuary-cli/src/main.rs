//! CLI for the actuary pipeline: run each stage and write JSON reports.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "actuary")]
#[command(about = "actuary — risk harmonics, statevector prediction, oracle consensus, revenue projection")]
#[command(version = actuary_core::VERSION)]
struct Cli {
    /// JSON config file; missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose a 40-element risk tensor into category harmonics and score it
    Harmonics {
        /// Comma-separated tensor values (generated from --seed when omitted)
        #[arg(long, allow_hyphen_values = true)]
        tensor: Option<String>,

        /// Seed for generated input
        #[arg(long)]
        seed: Option<u64>,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Run the statevector model over a feature vector
    Predict {
        /// Comma-separated feature values (generated from --seed when omitted)
        #[arg(long, allow_hyphen_values = true)]
        features: Option<String>,

        /// Seed for generated input and circuit parameters
        #[arg(long)]
        seed: Option<u64>,

        /// Length of generated feature vectors
        #[arg(long, default_value = "16")]
        dim: usize,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Train the statevector model toward a target with the parameter-shift rule
    Train {
        /// Comma-separated feature values (generated from --seed when omitted)
        #[arg(long, allow_hyphen_values = true)]
        features: Option<String>,

        /// Target prediction in [0, 1]
        #[arg(long)]
        target: f64,

        /// Number of training epochs
        #[arg(long, default_value = "10")]
        epochs: usize,

        /// Rotation gate: phase (default from config) or ry
        #[arg(long, value_parser = ["phase", "ry"])]
        rotation: Option<String>,

        /// Seed for generated input and circuit parameters
        #[arg(long)]
        seed: Option<u64>,

        /// Length of generated feature vectors
        #[arg(long, default_value = "16")]
        dim: usize,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Run the oracle consensus feed and report divergence
    Consensus {
        /// Comma-separated market data (generated from --seed when omitted)
        #[arg(long, allow_hyphen_values = true)]
        market_data: Option<String>,

        /// Number of prediction cycles
        #[arg(long, default_value = "1")]
        cycles: usize,

        /// Ground-truth value fed back after every cycle
        #[arg(long)]
        actual: Option<f64>,

        /// Seed for generated input and oracle noise
        #[arg(long)]
        seed: Option<u64>,

        /// Length of generated market data
        #[arg(long, default_value = "8")]
        dim: usize,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Project revenue and Care-Loop allocation
    Project {
        /// Start from a named preset: optimistic, base, conservative, pessimistic
        #[arg(long, default_value = "base")]
        scenario: String,

        #[arg(long)]
        active_brands: Option<f64>,

        #[arg(long)]
        avg_brand_value: Option<f64>,

        #[arg(long)]
        market_multiplier: Option<f64>,

        #[arg(long)]
        risk_adjustment: Option<f64>,

        /// Include ±step sensitivity analysis
        #[arg(long)]
        sensitivity: bool,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Project every scenario preset
    Scenarios {
        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Run all stages over generated input and blend them into one assessment
    Pipeline {
        /// Seed for generated input, circuit parameters and oracle noise
        #[arg(long)]
        seed: Option<u64>,

        /// Projection preset for the revenue inputs
        #[arg(long, default_value = "base")]
        scenario: String,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Start the HTTP actuary server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8090")]
        port: u16,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Harmonics {
            tensor,
            seed,
            output,
        } => commands::harmonics::run(&config, tensor.as_deref(), seed, output.as_deref()),
        Commands::Predict {
            features,
            seed,
            dim,
            output,
        } => commands::predict::run(&config, features.as_deref(), seed, dim, output.as_deref()),
        Commands::Train {
            features,
            target,
            epochs,
            rotation,
            seed,
            dim,
            output,
        } => commands::train::run(commands::train::TrainCommandConfig {
            config: &config,
            features: features.as_deref(),
            target,
            epochs,
            rotation: rotation.as_deref(),
            seed,
            dim,
            output_path: output.as_deref(),
        }),
        Commands::Consensus {
            market_data,
            cycles,
            actual,
            seed,
            dim,
            output,
        } => commands::consensus::run(commands::consensus::ConsensusCommandConfig {
            config: &config,
            market_data: market_data.as_deref(),
            cycles,
            actual,
            seed,
            dim,
            output_path: output.as_deref(),
        }),
        Commands::Project {
            scenario,
            active_brands,
            avg_brand_value,
            market_multiplier,
            risk_adjustment,
            sensitivity,
            output,
        } => commands::project::run(commands::project::ProjectCommandConfig {
            config: &config,
            scenario: &scenario,
            active_brands,
            avg_brand_value,
            market_multiplier,
            risk_adjustment,
            sensitivity,
            output_path: output.as_deref(),
        }),
        Commands::Scenarios { output } => commands::scenarios::run(&config, output.as_deref()),
        Commands::Pipeline {
            seed,
            scenario,
            output,
        } => commands::pipeline::run(config, seed, &scenario, output.as_deref()),
        Commands::Serve { host, port } => commands::serve::run(config, &host, port),
    }
}
