//! Parameterised statevector predictor with parameter-shift training.
//!
//! Each circuit layer applies one rotation per qubit (angles taken
//! round-robin from the parameter vector) followed by the fixed entangling
//! pattern. The prediction is the normalised expected basis index.
//!
//! Training costs two full circuit evaluations per parameter per step, so it
//! is only practical for small registers (the default 8 qubits x depth 10 is
//! 80 parameters). It does not scale to large qubit counts.

use std::f64::consts::{FRAC_PI_2, TAU};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::ModelConfig;
use crate::error::{ActuaryError, Result};
use crate::history::BoundedHistory;
use crate::statevector::{BasisProbability, QuantumState};

/// Output of [`PredictiveModel::predict`].
#[derive(Debug, Clone, Serialize)]
pub struct QuantumPrediction {
    /// Expected basis index scaled to [0, 1].
    pub prediction: f64,
    /// 1 + advantage_boost * coherence.
    pub quantum_advantage: f64,
    pub coherence: f64,
    /// min(max_confidence, prediction * quantum_advantage).
    pub confidence: f64,
    pub measured_states: Vec<BasisProbability>,
}

/// One training step.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingRecord {
    pub timestamp: DateTime<Utc>,
    pub loss: f64,
    pub prediction: f64,
    pub target: f64,
    pub gradient_norm: f64,
}

/// Statevector predictor that owns its circuit parameters.
#[derive(Debug, Clone)]
pub struct PredictiveModel {
    config: ModelConfig,
    params: Vec<f64>,
    history: BoundedHistory<TrainingRecord>,
}

impl PredictiveModel {
    /// Build a model with parameters drawn uniformly from [0, 2π).
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let params = (0..config.n_params())
            .map(|_| rng.random_range(0.0..TAU))
            .collect();
        let history = BoundedHistory::new(config.max_history)?;
        log::info!(
            "predictive model: {} qubits, depth {}, {} parameters",
            config.n_qubits,
            config.circuit_depth,
            config.n_params()
        );
        Ok(Self {
            config,
            params,
            history,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Replace the circuit parameters; length must be n_qubits * circuit_depth.
    pub fn set_params(&mut self, params: Vec<f64>) -> Result<()> {
        if params.len() != self.config.n_params() {
            return Err(ActuaryError::Dimension {
                expected: self.config.n_params(),
                actual: params.len(),
            });
        }
        crate::error::ensure_finite(&params, "circuit parameters")?;
        self.params = params;
        Ok(())
    }

    pub fn training_history(&self) -> Vec<TrainingRecord> {
        self.history.to_vec()
    }

    pub fn predict(&self, features: &[f64]) -> Result<QuantumPrediction> {
        let encoded = QuantumState::encode(features, self.config.n_qubits)?;
        let state = self.run_circuit(encoded, &self.params);

        let prediction = state.expectation();
        let coherence = state.coherence();
        let quantum_advantage = 1.0 + self.config.advantage_boost * coherence;
        let confidence = (prediction * quantum_advantage).min(self.config.max_confidence);

        Ok(QuantumPrediction {
            prediction,
            quantum_advantage,
            coherence,
            confidence,
            measured_states: state.significant_states(self.config.probability_floor),
        })
    }

    /// One parameter-shift gradient step toward `target`. Returns the
    /// squared error measured before the update.
    pub fn train_step(&mut self, features: &[f64], target: f64) -> Result<f64> {
        if !target.is_finite() {
            return Err(ActuaryError::NumericDomain(format!(
                "training target must be finite, got {target}"
            )));
        }
        let encoded = QuantumState::encode(features, self.config.n_qubits)?;
        let prediction = self.evaluate(&encoded, &self.params);
        let gradient = self.parameter_shift_gradient(&encoded);

        let error = prediction - target;
        let lr = self.config.learning_rate;
        for (p, g) in self.params.iter_mut().zip(&gradient) {
            *p = (*p - lr * g * error).rem_euclid(TAU);
        }

        let loss = error * error;
        let gradient_norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
        log::debug!(
            "train step: prediction={prediction:.6} target={target:.6} loss={loss:.6e} |grad|={gradient_norm:.3e}"
        );
        self.history.push(TrainingRecord {
            timestamp: Utc::now(),
            loss,
            prediction,
            target,
            gradient_norm,
        });
        Ok(loss)
    }

    /// Run `epochs` passes of `train_step` over `samples`; returns the mean
    /// loss of each epoch.
    pub fn fit(&mut self, samples: &[(Vec<f64>, f64)], epochs: usize) -> Result<Vec<f64>> {
        if samples.is_empty() {
            return Err(ActuaryError::Dimension {
                expected: 1,
                actual: 0,
            });
        }
        let mut epoch_losses = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let mut total = 0.0;
            for (features, target) in samples {
                total += self.train_step(features, *target)?;
            }
            let mean = total / samples.len() as f64;
            log::info!("epoch {}/{epochs}: mean loss {mean:.6e}", epoch + 1);
            epoch_losses.push(mean);
        }
        Ok(epoch_losses)
    }

    /// d prediction / d theta_i = (f(theta_i + π/2) - f(theta_i - π/2)) / 2.
    fn parameter_shift_gradient(&self, encoded: &QuantumState) -> Vec<f64> {
        let mut shifted = self.params.clone();
        (0..self.params.len())
            .map(|i| {
                let original = shifted[i];
                shifted[i] = original + FRAC_PI_2;
                let plus = self.evaluate(encoded, &shifted);
                shifted[i] = original - FRAC_PI_2;
                let minus = self.evaluate(encoded, &shifted);
                shifted[i] = original;
                (plus - minus) / 2.0
            })
            .collect()
    }

    fn evaluate(&self, encoded: &QuantumState, params: &[f64]) -> f64 {
        self.run_circuit(encoded.clone(), params).expectation()
    }

    fn run_circuit(&self, mut state: QuantumState, params: &[f64]) -> QuantumState {
        let n = self.config.n_qubits;
        for layer in 0..self.config.circuit_depth {
            for q in 0..n {
                let theta = params[(layer * n + q) % params.len()];
                state.rotate(self.config.rotation, q, theta);
            }
            state.entangle();
        }
        state
    }
}
