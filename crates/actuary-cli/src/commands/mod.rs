pub mod consensus;
pub mod harmonics;
pub mod pipeline;
pub mod predict;
pub mod project;
pub mod scenarios;
pub mod serve;
pub mod train;

use std::fmt::Display;

use actuary_core::ActuaryConfig;
use actuary_core::report::{Report, write_json};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Print an error and exit with status 1.
pub fn fail(err: impl Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

/// Load `--config` if given, otherwise defaults.
pub fn load_config(path: Option<&str>) -> ActuaryConfig {
    match path {
        Some(p) => ActuaryConfig::from_path(p).unwrap_or_else(|e| fail(e)),
        None => ActuaryConfig::default(),
    }
}

/// Parse comma-separated floats. Blank entries are skipped.
pub fn parse_vector(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(i, t)| {
            t.parse::<f64>()
                .map_err(|e| format!("value {} ('{t}') is not a number: {e}", i + 1))
        })
        .collect()
}

/// `len` uniform draws from [0, 1) under `seed`.
pub fn generate_vector(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(0.0..1.0)).collect()
}

/// Use the explicit vector when given, otherwise generate one.
pub fn resolve_vector(explicit: Option<&str>, seed: Option<u64>, len: usize, what: &str) -> Vec<f64> {
    match explicit {
        Some(s) => parse_vector(s).unwrap_or_else(|e| fail(format!("--{what}: {e}"))),
        None => {
            let seed = seed.unwrap_or_else(rand::random);
            log::info!("generated {len} {what} values from seed {seed}");
            generate_vector(len, seed)
        }
    }
}

/// Write `data` inside a report envelope when an output path is given.
pub fn write_report<T: Serialize>(output_path: Option<&str>, kind: &str, data: T) {
    if let Some(path) = output_path {
        write_json(path, &Report::new(kind, data)).unwrap_or_else(|e| fail(e));
        println!("\nReport written to {path}");
    }
}
