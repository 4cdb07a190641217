//! Blended actuarial assessment over all four stages.
//!
//! ```text
//! risk tensor ──► harmonics ──┐
//! features ─────► model ──────┼─► blended risk ─► effective risk adjustment ─► projection
//! market data ──► oracles ────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ActuaryConfig;
use crate::error::Result;
use crate::harmonics::{HarmonicsReport, TensorHarmonicsProcessor};
use crate::model::{PredictiveModel, QuantumPrediction};
use crate::oracle::{ConsensusPredictionRecord, OracleFeed};
use crate::projection::{ProjectionMetrics, RevenueProjection, RevenueProjector};

/// One evaluation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuaryInput {
    /// Length must equal `harmonics.tensor_len`.
    pub risk_tensor: Vec<f64>,
    pub features: Vec<f64>,
    pub market_data: Vec<f64>,
    pub metrics: ProjectionMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActuaryAssessment {
    pub timestamp: DateTime<Utc>,
    pub harmonics: HarmonicsReport,
    pub prediction: QuantumPrediction,
    pub consensus: ConsensusPredictionRecord,
    /// Weighted blend of the three signals, in [0, 1].
    pub blended_risk: f64,
    /// Caller's risk_adjustment scaled down by the blended risk.
    pub effective_risk_adjustment: f64,
    pub projection: RevenueProjection,
}

/// Owns one instance of every stage.
#[derive(Debug)]
pub struct ActuaryCore {
    config: ActuaryConfig,
    harmonics: TensorHarmonicsProcessor,
    model: PredictiveModel,
    feed: OracleFeed,
    projector: RevenueProjector,
}

impl ActuaryCore {
    pub fn new(config: ActuaryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            harmonics: TensorHarmonicsProcessor::new(config.harmonics.clone())?,
            model: PredictiveModel::new(config.model.clone())?,
            feed: OracleFeed::new(config.oracle.clone())?,
            projector: RevenueProjector::new(config.projection.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &ActuaryConfig {
        &self.config
    }

    pub fn harmonics(&self) -> &TensorHarmonicsProcessor {
        &self.harmonics
    }

    pub fn model(&self) -> &PredictiveModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut PredictiveModel {
        &mut self.model
    }

    pub fn feed(&self) -> &OracleFeed {
        &self.feed
    }

    pub fn projector(&self) -> &RevenueProjector {
        &self.projector
    }

    /// Run every stage over `input` and project revenue under the blended risk.
    pub fn evaluate(&self, input: &ActuaryInput) -> Result<ActuaryAssessment> {
        input.metrics.validate()?;
        let harmonics = self.harmonics.process(&input.risk_tensor)?;
        let prediction = self.model.predict(&input.features)?;
        let consensus = self.feed.predict(&input.market_data)?;

        let blended_risk = self.blend(
            harmonics.aggregate.total_risk_score,
            prediction.prediction,
            consensus.consensus_prediction,
        );
        let effective_risk_adjustment = input.metrics.risk_adjustment
            * (1.0 - self.config.blend.risk_sensitivity * blended_risk);
        let projection = self.projector.project(&ProjectionMetrics {
            risk_adjustment: effective_risk_adjustment,
            ..input.metrics
        })?;

        log::info!(
            "assessment: risk {} ({:.2}), blended {:.4}, adjusted revenue {:.2}",
            harmonics.aggregate.risk_level,
            harmonics.aggregate.total_risk_score,
            blended_risk,
            projection.risk_adjusted_revenue
        );
        Ok(ActuaryAssessment {
            timestamp: Utc::now(),
            harmonics,
            prediction,
            consensus,
            blended_risk,
            effective_risk_adjustment,
            projection,
        })
    }

    /// `w_h * score/100 + w_m * prediction + w_c * clamp(consensus, 0, 1)`
    /// with weights normalised to sum 1.
    pub fn blend(&self, risk_score: f64, prediction: f64, consensus: f64) -> f64 {
        let [wh, wm, wc] = self.config.blend.normalized();
        let blended = wh * (risk_score / 100.0).clamp(0.0, 1.0)
            + wm * prediction.clamp(0.0, 1.0)
            + wc * consensus.clamp(0.0, 1.0);
        blended.clamp(0.0, 1.0)
    }
}
