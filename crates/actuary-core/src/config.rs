//! Tunable constants for every pipeline stage.
//!
//! The numbers here are simulation knobs, not derived physical constants.
//! Each sub-config documents its default and validates itself; stage
//! constructors call `validate()` before building anything.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ActuaryError, Result};

/// Full pipeline configuration. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuaryConfig {
    pub harmonics: HarmonicsConfig,
    pub model: ModelConfig,
    pub oracle: OracleFeedConfig,
    pub projection: ProjectionConfig,
    pub blend: BlendConfig,
}

impl ActuaryConfig {
    /// Load a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: ActuaryConfig = serde_json::from_str(&text).map_err(|e| {
            ActuaryError::Configuration(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        log::info!("loaded actuary config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.harmonics.validate()?;
        self.model.validate()?;
        self.oracle.validate()?;
        self.projection.validate()?;
        self.blend.validate()
    }
}

// ---------------------------------------------------------------------------
// Harmonics
// ---------------------------------------------------------------------------

/// Risk-tensor harmonic decomposition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonicsConfig {
    /// Required tensor length.
    pub tensor_len: usize,
    /// Length of each category sub-vector.
    pub category_len: usize,
    /// Number of frequency bands per category.
    pub n_bands: usize,
    /// Weight of the market category energy.
    pub market_weight: f64,
    /// Weight of the operational category energy.
    pub operational_weight: f64,
    /// Weight of the strategic category energy.
    pub strategic_weight: f64,
    /// Weight of the financial category energy.
    pub financial_weight: f64,
    /// Aggregate score = min(100, weighted energy / score_scale).
    pub score_scale: f64,
    /// Added inside the log of the entropy term; must be positive.
    pub entropy_epsilon: f64,
}

impl Default for HarmonicsConfig {
    fn default() -> Self {
        Self {
            tensor_len: 40,
            category_len: 10,
            n_bands: 8,
            market_weight: 0.30,
            operational_weight: 0.25,
            strategic_weight: 0.25,
            financial_weight: 0.20,
            score_scale: 100.0,
            entropy_epsilon: 1e-10,
        }
    }
}

impl HarmonicsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.category_len == 0 || self.tensor_len != self.category_len * 4 {
            return Err(ActuaryError::Configuration(format!(
                "tensor_len {} must be four categories of category_len {}",
                self.tensor_len, self.category_len
            )));
        }
        if self.n_bands == 0 || self.n_bands > self.category_len {
            return Err(ActuaryError::Configuration(format!(
                "n_bands must be in 1..={}, got {}",
                self.category_len, self.n_bands
            )));
        }
        let weights = self.category_weights();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ActuaryError::Configuration(
                "category weights must be finite and non-negative".to_string(),
            ));
        }
        if !(self.score_scale.is_finite() && self.score_scale > 0.0) {
            return Err(ActuaryError::Configuration(
                "score_scale must be positive".to_string(),
            ));
        }
        if !(self.entropy_epsilon.is_finite() && self.entropy_epsilon > 0.0) {
            return Err(ActuaryError::Configuration(format!(
                "entropy_epsilon must be positive, got {}",
                self.entropy_epsilon
            )));
        }
        Ok(())
    }

    /// Weights in category order: market, operational, strategic, financial.
    pub fn category_weights(&self) -> [f64; 4] {
        [
            self.market_weight,
            self.operational_weight,
            self.strategic_weight,
            self.financial_weight,
        ]
    }
}

// ---------------------------------------------------------------------------
// Statevector model
// ---------------------------------------------------------------------------

/// Single-qubit rotation applied in each circuit layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationGate {
    /// Multiply amplitudes with the qubit bit set by `exp(iθ)`.
    Phase,
    /// Real rotation mixing the |0> and |1> amplitudes of the qubit.
    Ry,
}

/// Statevector predictive model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_qubits: usize,
    pub circuit_depth: usize,
    pub learning_rate: f64,
    /// quantum_advantage = 1 + advantage_boost * coherence.
    pub advantage_boost: f64,
    /// Upper clamp on reported confidence.
    pub max_confidence: f64,
    /// Basis states below this probability are left out of reports.
    pub probability_floor: f64,
    pub rotation: RotationGate,
    /// Seed for parameter initialisation; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Retained training records.
    pub max_history: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_qubits: 8,
            circuit_depth: 10,
            learning_rate: 0.1,
            advantage_boost: 0.15,
            max_confidence: 0.99,
            probability_floor: 1e-6,
            rotation: RotationGate::Phase,
            seed: None,
            max_history: 100,
        }
    }
}

/// Largest register the simulator accepts (2^16 amplitudes).
pub const MAX_QUBITS: usize = 16;

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_qubits == 0 || self.n_qubits > MAX_QUBITS {
            return Err(ActuaryError::Configuration(format!(
                "n_qubits must be in 1..={MAX_QUBITS}, got {}",
                self.n_qubits
            )));
        }
        if self.circuit_depth == 0 {
            return Err(ActuaryError::Configuration(
                "circuit_depth must be at least 1".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(ActuaryError::Configuration(
                "learning_rate must be finite and non-negative".to_string(),
            ));
        }
        if self.max_history == 0 {
            return Err(ActuaryError::Configuration(
                "model max_history must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn n_params(&self) -> usize {
        self.n_qubits * self.circuit_depth
    }
}

// ---------------------------------------------------------------------------
// Oracle consensus feed
// ---------------------------------------------------------------------------

/// How the correlation-transformed prediction vector is rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusNormalization {
    /// Divide by the largest absolute entry.
    MaxAbs,
    /// Divide each entry by its matrix row sum (keeps prediction scale).
    RowSum,
}

/// Oracle feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleFeedConfig {
    pub n_oracles: usize,
    /// Nominal prediction cycle length in seconds.
    pub cycle_seconds: f64,
    /// Noise std = noise_scale * (1 - coherence_time / cycle_seconds).
    pub noise_scale: f64,
    pub min_noise_std: f64,
    pub initial_accuracy: f64,
    /// EMA factor applied to the previous accuracy.
    pub accuracy_decay: f64,
    pub phase_learning_rate: f64,
    /// Divergence (percent) counted as "on target" in metrics.
    pub target_divergence_percent: f64,
    pub normalization: ConsensusNormalization,
    pub seed: Option<u64>,
    pub max_history: usize,
}

impl Default for OracleFeedConfig {
    fn default() -> Self {
        Self {
            n_oracles: 10,
            cycle_seconds: 10.0,
            noise_scale: 0.01,
            min_noise_std: 0.001,
            initial_accuracy: 0.95,
            accuracy_decay: 0.95,
            phase_learning_rate: 0.1,
            target_divergence_percent: 0.003,
            normalization: ConsensusNormalization::MaxAbs,
            seed: None,
            max_history: 1000,
        }
    }
}

impl OracleFeedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_oracles == 0 {
            return Err(ActuaryError::Configuration(
                "n_oracles must be at least 1".to_string(),
            ));
        }
        if !(self.cycle_seconds.is_finite() && self.cycle_seconds > 0.0) {
            return Err(ActuaryError::Configuration(format!(
                "cycle_seconds must be positive, got {}",
                self.cycle_seconds
            )));
        }
        if !(self.min_noise_std.is_finite() && self.min_noise_std > 0.0) {
            return Err(ActuaryError::Configuration(
                "min_noise_std must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_accuracy) {
            return Err(ActuaryError::Configuration(
                "initial_accuracy must be in [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.accuracy_decay) {
            return Err(ActuaryError::Configuration(
                "accuracy_decay must be in [0, 1]".to_string(),
            ));
        }
        if self.max_history == 0 {
            return Err(ActuaryError::Configuration(
                "oracle max_history must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Revenue projection
// ---------------------------------------------------------------------------

/// Revenue and Care-Loop projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Fraction of adjusted revenue set aside for the Care Loop.
    pub care_loop_rate: f64,
    /// Daily compounding rate for horizon projections.
    pub daily_growth_rate: f64,
    pub horizons_days: Vec<u32>,
    /// Reference revenue for target-achievement percentage.
    pub target_revenue: f64,
    /// Relative move applied to each input in sensitivity analysis.
    pub sensitivity_step: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            care_loop_rate: 0.15,
            daily_growth_rate: 0.0012,
            horizons_days: vec![30, 90, 365],
            target_revenue: 1.45e9,
            sensitivity_step: 0.10,
        }
    }
}

impl ProjectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.care_loop_rate) {
            return Err(ActuaryError::Configuration(
                "care_loop_rate must be in [0, 1]".to_string(),
            ));
        }
        if !self.daily_growth_rate.is_finite() || self.daily_growth_rate <= -1.0 {
            return Err(ActuaryError::Configuration(
                "daily_growth_rate must be finite and greater than -1".to_string(),
            ));
        }
        if !(self.target_revenue.is_finite() && self.target_revenue > 0.0) {
            return Err(ActuaryError::Configuration(
                "target_revenue must be positive".to_string(),
            ));
        }
        if !(self.sensitivity_step.is_finite() && self.sensitivity_step > 0.0) {
            return Err(ActuaryError::Configuration(
                "sensitivity_step must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Actuary blend
// ---------------------------------------------------------------------------

/// Weights for blending the three risk signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub harmonics_weight: f64,
    pub model_weight: f64,
    pub consensus_weight: f64,
    /// How far the blended risk pulls the caller's risk adjustment down.
    pub risk_sensitivity: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            harmonics_weight: 0.30,
            model_weight: 0.35,
            consensus_weight: 0.35,
            risk_sensitivity: 0.10,
        }
    }
}

impl BlendConfig {
    pub fn validate(&self) -> Result<()> {
        let w = [self.harmonics_weight, self.model_weight, self.consensus_weight];
        if w.iter().any(|x| !x.is_finite() || *x < 0.0) || w.iter().sum::<f64>() <= 0.0 {
            return Err(ActuaryError::Configuration(
                "blend weights must be non-negative with a positive sum".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.risk_sensitivity) {
            return Err(ActuaryError::Configuration(
                "risk_sensitivity must be in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Weights rescaled to sum to 1, in (harmonics, model, consensus) order.
    pub fn normalized(&self) -> [f64; 3] {
        let total = self.harmonics_weight + self.model_weight + self.consensus_weight;
        [
            self.harmonics_weight / total,
            self.model_weight / total,
            self.consensus_weight / total,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        ActuaryConfig::default().validate().unwrap();
    }

    #[test]
    fn default_constants() {
        let c = ActuaryConfig::default();
        assert_eq!(c.harmonics.category_weights(), [0.30, 0.25, 0.25, 0.20]);
        assert_eq!(c.model.n_params(), 80);
        assert_eq!(c.projection.care_loop_rate, 0.15);
        assert_eq!(c.projection.daily_growth_rate, 0.0012);
        assert_eq!(c.model.advantage_boost, 0.15);
    }

    #[test]
    fn zero_oracles_rejected() {
        let cfg = OracleFeedConfig {
            n_oracles: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ActuaryError::Configuration(_))
        ));
    }

    #[test]
    fn zero_qubits_rejected() {
        let cfg = ModelConfig {
            n_qubits: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_positive_cycle_rejected() {
        for cycle in [0.0, -1.0, f64::NAN] {
            let cfg = OracleFeedConfig {
                cycle_seconds: cycle,
                ..Default::default()
            };
            assert!(cfg.validate().is_err(), "cycle {cycle} accepted");
        }
    }

    #[test]
    fn bad_entropy_epsilon_rejected() {
        for eps in [0.0, -1e-10, f64::NAN, f64::INFINITY] {
            let cfg = HarmonicsConfig {
                entropy_epsilon: eps,
                ..Default::default()
            };
            assert!(
                matches!(cfg.validate(), Err(ActuaryError::Configuration(_))),
                "epsilon {eps} accepted"
            );
        }
        let tiny = HarmonicsConfig {
            entropy_epsilon: 1e-300,
            ..Default::default()
        };
        tiny.validate().unwrap();
    }

    #[test]
    fn blend_weights_normalize() {
        let b = BlendConfig {
            harmonics_weight: 1.0,
            model_weight: 1.0,
            consensus_weight: 2.0,
            risk_sensitivity: 0.1,
        };
        let n = b.normalized();
        assert!((n.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((n[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "oracle": {{ "n_oracles": 4, "seed": 7, "normalization": "row_sum" }} }}"#
        )
        .unwrap();
        let cfg = ActuaryConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.oracle.n_oracles, 4);
        assert_eq!(cfg.oracle.seed, Some(7));
        assert_eq!(cfg.oracle.normalization, ConsensusNormalization::RowSum);
        assert_eq!(cfg.oracle.cycle_seconds, 10.0);
        assert_eq!(cfg.model.circuit_depth, 10);
    }

    #[test]
    fn invalid_json_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ActuaryConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ActuaryError::Configuration(_)));
    }
}
