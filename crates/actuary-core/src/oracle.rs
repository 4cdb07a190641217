//! Oracle consensus feed.
//!
//! N noisy predictors run over the same market vector. Their raw outputs pass
//! through a distance-decay correlation matrix and are blended with
//! accuracy-times-strength weights into one consensus value. Ground-truth
//! feedback nudges each oracle's accuracy and phase.
//!
//! All mutable state lives behind a single mutex, so one feed can be shared
//! across threads as `Arc<OracleFeed>`.

use std::f64::consts::TAU;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::config::{ConsensusNormalization, OracleFeedConfig};
use crate::error::{ActuaryError, Result, ensure_finite};
use crate::history::BoundedHistory;

/// Below this magnitude the consensus is not used as a divisor.
const CONSENSUS_EPSILON: f64 = 1e-6;

/// One simulated predictor.
#[derive(Debug, Clone, Serialize)]
pub struct Oracle {
    pub id: usize,
    /// Radians, kept in [0, 2π).
    pub phase: f64,
    pub entanglement_strength: f64,
    pub coherence_time: f64,
    /// EMA of (1 - absolute error), in [0, 1].
    pub accuracy_score: f64,
    pub last_update: DateTime<Utc>,
}

/// Snapshot of one prediction cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusPredictionRecord {
    pub timestamp: DateTime<Utc>,
    pub raw_predictions: Vec<f64>,
    pub oracle_weights: Vec<f64>,
    pub consensus_prediction: f64,
    pub divergence_percent: f64,
    pub cycle_duration_ms: f64,
}

/// Summary statistics over the retained divergence history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DivergenceMetrics {
    pub samples: usize,
    pub current: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p95: f64,
    /// Fraction of cycles at or below the configured target divergence.
    pub within_target_ratio: f64,
    pub mean_cycle_ms: f64,
}

struct FeedState {
    oracles: Vec<Oracle>,
    rng: StdRng,
    history: BoundedHistory<ConsensusPredictionRecord>,
}

/// Thread-safe consensus feed over `n_oracles` predictors.
pub struct OracleFeed {
    config: OracleFeedConfig,
    entanglement_matrix: Vec<Vec<f64>>,
    state: Mutex<FeedState>,
}

impl std::fmt::Debug for OracleFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleFeed")
            .field("n_oracles", &self.config.n_oracles)
            .field("normalization", &self.config.normalization)
            .finish_non_exhaustive()
    }
}

impl OracleFeed {
    pub fn new(config: OracleFeedConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let now = Utc::now();
        let oracles = (0..config.n_oracles)
            .map(|id| Oracle {
                id,
                phase: rng.random_range(0.0..TAU),
                entanglement_strength: rng.random_range(0.7..=1.0),
                coherence_time: rng.random_range(8.5..=9.5),
                accuracy_score: config.initial_accuracy,
                last_update: now,
            })
            .collect();
        let entanglement_matrix = entanglement_matrix(config.n_oracles);
        let history = BoundedHistory::new(config.max_history)?;

        log::info!(
            "oracle feed: {} oracles, {:?} normalization, history {}",
            config.n_oracles,
            config.normalization,
            config.max_history
        );
        Ok(Self {
            config,
            entanglement_matrix,
            state: Mutex::new(FeedState {
                oracles,
                rng,
                history,
            }),
        })
    }

    pub fn config(&self) -> &OracleFeedConfig {
        &self.config
    }

    pub fn entanglement_matrix(&self) -> &[Vec<f64>] {
        &self.entanglement_matrix
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        // Every mutation leaves FeedState consistent, so a poisoned lock is safe to reuse.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run every oracle over `market_data` and blend a consensus.
    pub fn predict(&self, market_data: &[f64]) -> Result<ConsensusPredictionRecord> {
        if market_data.is_empty() {
            return Err(ActuaryError::Dimension {
                expected: 1,
                actual: 0,
            });
        }
        ensure_finite(market_data, "market data")?;
        let start = Instant::now();
        let mut state = self.lock();

        let FeedState { oracles, rng, .. } = &mut *state;
        let mut raw_predictions = Vec::with_capacity(oracles.len());
        for oracle in oracles.iter() {
            raw_predictions.push(self.oracle_prediction(oracle, market_data, rng)?);
        }
        let oracle_weights = oracle_weights(oracles);

        let transformed = self.correlate(&raw_predictions);
        let consensus_prediction: f64 = oracle_weights
            .iter()
            .zip(&transformed)
            .map(|(w, t)| w * t)
            .sum();
        let divergence_percent = divergence_percent(&raw_predictions, consensus_prediction);
        let cycle_duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let record = ConsensusPredictionRecord {
            timestamp: Utc::now(),
            raw_predictions,
            oracle_weights,
            consensus_prediction,
            divergence_percent,
            cycle_duration_ms,
        };
        log::debug!(
            "consensus {:.6} divergence {:.4}% in {:.3} ms",
            record.consensus_prediction,
            record.divergence_percent,
            record.cycle_duration_ms
        );
        state.history.push(record.clone());
        Ok(record)
    }

    /// Mean magnitude of the phase-rotated input plus Gaussian noise, clipped to [0, 1].
    fn oracle_prediction(&self, oracle: &Oracle, data: &[f64], rng: &mut StdRng) -> Result<f64> {
        let rotation = rustfft::num_complex::Complex::from_polar(1.0, oracle.phase);
        let mean_magnitude =
            data.iter().map(|&x| (rotation * x).norm()).sum::<f64>() / data.len() as f64;

        let std = (self.config.noise_scale
            * (1.0 - oracle.coherence_time / self.config.cycle_seconds))
            .max(self.config.min_noise_std);
        let noise = Normal::new(0.0, std)
            .map_err(|e| ActuaryError::Configuration(format!("noise distribution: {e}")))?;
        Ok((mean_magnitude + noise.sample(rng)).clamp(0.0, 1.0))
    }

    /// Apply the correlation matrix and rescale per the configured normalisation.
    fn correlate(&self, raw: &[f64]) -> Vec<f64> {
        let mut transformed: Vec<f64> = self
            .entanglement_matrix
            .iter()
            .map(|row| row.iter().zip(raw).map(|(m, r)| m * r).sum())
            .collect();
        match self.config.normalization {
            ConsensusNormalization::MaxAbs => {
                let max = transformed.iter().fold(0.0_f64, |acc, t| acc.max(t.abs()));
                if max > 0.0 {
                    transformed.iter_mut().for_each(|t| *t /= max);
                }
            }
            ConsensusNormalization::RowSum => {
                for (t, row) in transformed.iter_mut().zip(&self.entanglement_matrix) {
                    *t /= row.iter().sum::<f64>();
                }
            }
        }
        transformed
    }

    /// Feed back a ground-truth value against the most recent prediction.
    /// Does nothing when no prediction has been made yet.
    pub fn update_accuracy(&self, actual: f64) -> Result<()> {
        if !actual.is_finite() {
            return Err(ActuaryError::NumericDomain(format!(
                "actual value must be finite, got {actual}"
            )));
        }
        let mut state = self.lock();
        let FeedState {
            oracles, history, ..
        } = &mut *state;
        let Some(latest) = history.latest() else {
            log::warn!("update_accuracy({actual}) before any prediction; ignored");
            return Ok(());
        };

        let decay = self.config.accuracy_decay;
        let lr = self.config.phase_learning_rate;
        let now = Utc::now();
        for (oracle, &raw) in oracles.iter_mut().zip(&latest.raw_predictions) {
            let error = (raw - actual).abs();
            oracle.accuracy_score =
                (decay * oracle.accuracy_score + (1.0 - decay) * (1.0 - error)).clamp(0.0, 1.0);
            oracle.phase = (oracle.phase + lr * error * sign(raw - actual)).rem_euclid(TAU);
            oracle.last_update = now;
        }
        log::debug!("oracle accuracies updated against actual {actual}");
        Ok(())
    }

    pub fn get_divergence_metrics(&self) -> DivergenceMetrics {
        let state = self.lock();
        let divergences: Vec<f64> = state.history.iter().map(|r| r.divergence_percent).collect();
        let Some(&current) = divergences.last() else {
            return DivergenceMetrics::default();
        };
        let samples = divergences.len();
        let cycle_ms: Vec<f64> = state.history.iter().map(|r| r.cycle_duration_ms).collect();
        drop(state);

        let target = self.config.target_divergence_percent;
        let within = divergences.iter().filter(|&&d| d <= target).count();
        let std_dev = if samples > 1 {
            Statistics::std_dev(&divergences)
        } else {
            0.0
        };
        let mut data = Data::new(divergences.clone());

        DivergenceMetrics {
            samples,
            current,
            mean: Statistics::mean(&divergences),
            std_dev,
            min: Statistics::min(&divergences),
            max: Statistics::max(&divergences),
            median: data.percentile(50),
            p95: data.percentile(95),
            within_target_ratio: within as f64 / samples as f64,
            mean_cycle_ms: Statistics::mean(&cycle_ms),
        }
    }

    /// Copy of the current oracle records.
    pub fn oracles(&self) -> Vec<Oracle> {
        self.lock().oracles.clone()
    }

    /// Retained prediction records, oldest first.
    pub fn history(&self) -> Vec<ConsensusPredictionRecord> {
        self.lock().history.to_vec()
    }
}

/// `M[i][i] = 1`, `M[i][j] = exp(-|i - j| / (n / 4))`.
pub fn entanglement_matrix(n: usize) -> Vec<Vec<f64>> {
    let scale = n as f64 / 4.0;
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        1.0
                    } else {
                        (-(i.abs_diff(j) as f64) / scale).exp()
                    }
                })
                .collect()
        })
        .collect()
}

/// accuracy * strength per oracle, normalised to sum 1.
fn oracle_weights(oracles: &[Oracle]) -> Vec<f64> {
    let raw: Vec<f64> = oracles
        .iter()
        .map(|o| o.accuracy_score * o.entanglement_strength)
        .collect();
    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.iter().map(|w| w / total).collect()
    } else {
        log::warn!("all oracle weights are zero; using uniform weights");
        vec![1.0 / oracles.len() as f64; oracles.len()]
    }
}

/// Mean absolute deviation from `consensus` as a percentage of |consensus|.
/// Near-zero consensus skips the division.
pub fn divergence_percent(raw: &[f64], consensus: f64) -> f64 {
    if raw.is_empty() {
        return 0.0;
    }
    let mad = raw.iter().map(|r| (r - consensus).abs()).sum::<f64>() / raw.len() as f64;
    if consensus.abs() < CONSENSUS_EPSILON {
        mad * 100.0
    } else {
        mad / consensus.abs() * 100.0
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seeded(n: usize, seed: u64) -> OracleFeed {
        OracleFeed::new(OracleFeedConfig {
            n_oracles: n,
            seed: Some(seed),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let m = entanglement_matrix(8);
        for i in 0..8 {
            assert_eq!(m[i][i], 1.0);
            for j in 0..8 {
                assert_eq!(m[i][j], m[j][i]);
            }
        }
        assert!((m[0][2] - (-1.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn oracles_initialised_in_range() {
        let feed = seeded(10, 3);
        let oracles = feed.oracles();
        assert_eq!(oracles.len(), 10);
        for o in &oracles {
            assert!((0.0..TAU).contains(&o.phase));
            assert!((0.7..=1.0).contains(&o.entanglement_strength));
            assert!((8.5..=9.5).contains(&o.coherence_time));
            assert_eq!(o.accuracy_score, 0.95);
        }
    }

    #[test]
    fn predict_produces_weights_summing_to_one() {
        let feed = seeded(10, 11);
        let record = feed.predict(&[0.4, 0.5, 0.6]).unwrap();
        assert_eq!(record.raw_predictions.len(), 10);
        assert!(record.raw_predictions.iter().all(|r| (0.0..=1.0).contains(r)));
        assert!((record.oracle_weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(record.divergence_percent >= 0.0);
        assert!(record.consensus_prediction.is_finite());
    }

    #[test]
    fn seeded_feeds_agree() {
        let a = seeded(10, 99);
        let b = seeded(10, 99);
        let x = [0.1, 0.7, 0.3, 0.9];
        for _ in 0..3 {
            assert_eq!(
                a.predict(&x).unwrap().consensus_prediction,
                b.predict(&x).unwrap().consensus_prediction
            );
        }
    }

    #[test]
    fn empty_and_non_finite_input_rejected() {
        let feed = seeded(4, 1);
        assert!(matches!(
            feed.predict(&[]),
            Err(ActuaryError::Dimension { .. })
        ));
        assert!(matches!(
            feed.predict(&[0.5, f64::NAN]),
            Err(ActuaryError::NumericDomain(_))
        ));
        assert!(feed.history().is_empty());
    }

    #[test]
    fn update_before_predict_is_noop() {
        let feed = seeded(5, 2);
        let before = feed.oracles();
        feed.update_accuracy(0.5).unwrap();
        let after = feed.oracles();
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.accuracy_score, b.accuracy_score);
            assert_eq!(a.phase, b.phase);
        }
    }

    #[test]
    fn update_moves_accuracy_toward_error() {
        let feed = seeded(6, 5);
        let record = feed.predict(&[0.5; 4]).unwrap();
        feed.update_accuracy(0.5).unwrap();
        for (o, raw) in feed.oracles().iter().zip(&record.raw_predictions) {
            let expected = 0.95 * 0.95 + 0.05 * (1.0 - (raw - 0.5).abs());
            assert!((o.accuracy_score - expected).abs() < 1e-12);
            assert!((0.0..TAU).contains(&o.phase));
        }
        assert!(feed.update_accuracy(f64::INFINITY).is_err());
    }

    #[test]
    fn update_nudges_phase_by_signed_error() {
        let reference = seeded(6, 9);
        let raws = reference.predict(&[0.3, 0.7, 0.2, 0.9]).unwrap().raw_predictions;
        let lo = raws.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = raws.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Below every raw prediction the nudge is positive, above it negative.
        for actual in [lo - 0.25, hi + 0.25] {
            let feed = seeded(6, 9);
            let phases: Vec<f64> = feed.oracles().iter().map(|o| o.phase).collect();
            let record = feed.predict(&[0.3, 0.7, 0.2, 0.9]).unwrap();
            assert_eq!(record.raw_predictions, raws);
            feed.update_accuracy(actual).unwrap();

            for ((o, &before), &raw) in feed.oracles().iter().zip(&phases).zip(&raws) {
                let delta = raw - actual;
                let expected = (before + 0.1 * delta.abs() * delta.signum()).rem_euclid(TAU);
                assert!(
                    (o.phase - expected).abs() < 1e-12,
                    "phase {} != {expected} for raw {raw}, actual {actual}",
                    o.phase
                );
            }
        }
    }

    #[test]
    fn divergence_zero_when_all_equal_consensus() {
        assert_eq!(divergence_percent(&[0.4, 0.4, 0.4], 0.4), 0.0);
        assert!(divergence_percent(&[0.1, 0.9], 0.5) > 0.0);
        // |consensus| below epsilon: raw MAD in percent.
        assert!((divergence_percent(&[0.01, -0.01], 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn row_sum_keeps_prediction_scale() {
        let feed = OracleFeed::new(OracleFeedConfig {
            n_oracles: 6,
            normalization: ConsensusNormalization::RowSum,
            seed: Some(8),
            ..Default::default()
        })
        .unwrap();
        let t = feed.correlate(&[0.3; 6]);
        assert!(t.iter().all(|x| (x - 0.3).abs() < 1e-12));
    }

    #[test]
    fn max_abs_caps_transformed_at_one() {
        let feed = seeded(6, 8);
        let t = feed.correlate(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let max = t.iter().cloned().fold(f64::MIN, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
    }

    #[test]
    fn divergence_metrics_summarise_history() {
        let feed = seeded(10, 21);
        assert_eq!(feed.get_divergence_metrics().samples, 0);
        for i in 0..20 {
            feed.predict(&[0.2 + i as f64 * 0.01, 0.6, 0.4]).unwrap();
        }
        let m = feed.get_divergence_metrics();
        assert_eq!(m.samples, 20);
        assert!(m.min <= m.median && m.median <= m.max);
        assert!(m.min <= m.mean && m.mean <= m.max);
        assert!(m.p95 <= m.max + 1e-12);
        assert!((0.0..=1.0).contains(&m.within_target_ratio));
        assert_eq!(m.current, feed.history().last().unwrap().divergence_percent);
    }

    #[test]
    fn history_is_bounded() {
        let feed = OracleFeed::new(OracleFeedConfig {
            n_oracles: 3,
            seed: Some(4),
            max_history: 5,
            ..Default::default()
        })
        .unwrap();
        for _ in 0..12 {
            feed.predict(&[0.5]).unwrap();
        }
        assert_eq!(feed.history().len(), 5);
    }

    #[test]
    fn shared_feed_across_threads() {
        let feed = Arc::new(seeded(8, 17));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let feed = Arc::clone(&feed);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        feed.predict(&[0.1 * t as f64, 0.05 * i as f64, 0.5]).unwrap();
                        feed.update_accuracy(0.5).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(feed.history().len(), 40);
        assert!(
            feed.oracles()
                .iter()
                .all(|o| (0.0..=1.0).contains(&o.accuracy_score))
        );
    }
}
