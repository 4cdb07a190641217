//! # actuary-core
//!
//! Batch numerical pipeline for actuarial risk simulation.
//!
//! ## Quick Start
//!
//! ```
//! use actuary_core::{ProjectionConfig, RevenueProjector, Scenario};
//!
//! let projector = RevenueProjector::new(ProjectionConfig::default()).unwrap();
//! let projection = projector.project(&Scenario::Base.metrics()).unwrap();
//! assert!(projection.net_revenue < projection.risk_adjusted_revenue);
//! ```
//!
//! ## Stages
//!
//! - [`TensorHarmonicsProcessor`]: DFT band decomposition of a 40-element risk
//!   tensor into four categories, weighted into a 0-100 risk score.
//! - [`PredictiveModel`]: statevector simulation with parameterised rotations,
//!   a fixed entangling pattern, and parameter-shift training.
//! - [`OracleFeed`]: N noisy predictors blended through a distance-decay
//!   correlation matrix into a consensus value, with online accuracy updates.
//! - [`RevenueProjector`]: revenue, Care-Loop allocation, compounded horizons,
//!   scenario presets and sensitivity.
//!
//! [`ActuaryCore`] runs all four over one [`ActuaryInput`]. Results serialise
//! to JSON through [`report::Report`].
//!
//! None of the "quantum" vocabulary implies hardware: a `QuantumState` is a
//! unit-norm complex vector and every gate is a linear transform on it.

pub mod actuary;
pub mod config;
pub mod error;
pub mod harmonics;
pub mod history;
pub mod model;
pub mod oracle;
pub mod projection;
pub mod report;
pub mod statevector;

pub use actuary::{ActuaryAssessment, ActuaryCore, ActuaryInput};
pub use config::{
    ActuaryConfig, BlendConfig, ConsensusNormalization, HarmonicsConfig, ModelConfig,
    OracleFeedConfig, ProjectionConfig, RotationGate,
};
pub use error::{ActuaryError, Result};
pub use harmonics::{
    AggregateRiskScore, CategoryHarmonics, HarmonicResult, HarmonicsReport, RiskCategory,
    RiskLevel, TensorHarmonicsProcessor,
};
pub use history::BoundedHistory;
pub use model::{PredictiveModel, QuantumPrediction, TrainingRecord};
pub use oracle::{ConsensusPredictionRecord, DivergenceMetrics, Oracle, OracleFeed};
pub use projection::{
    HorizonProjection, ProjectionMetrics, RevenueProjection, RevenueProjector, Scenario,
    ScenarioResult, SensitivityEntry,
};
pub use report::Report;
pub use statevector::{BasisProbability, QuantumState};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
