//! Tensor risk harmonics: frequency-domain decomposition of a risk tensor.
//!
//! A 40-element risk tensor is four contiguous 10-element category
//! sub-vectors (market, operational, strategic, financial). Each category is
//! transformed with a DFT; its magnitude spectrum is averaged into bands and
//! summarised by dominant bin, spectral energy and Shannon entropy. The four
//! energies are blended into a single 0-100 risk score.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use crate::config::HarmonicsConfig;
use crate::error::{ActuaryError, Result, ensure_finite};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Risk category, in tensor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Market,
    Operational,
    Strategic,
    Financial,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Market,
        RiskCategory::Operational,
        RiskCategory::Strategic,
        RiskCategory::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Market => "market",
            RiskCategory::Operational => "operational",
            RiskCategory::Strategic => "strategic",
            RiskCategory::Financial => "financial",
        }
    }
}

/// Risk label derived from the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
    Critical,
}

impl RiskLevel {
    /// <20 LOW, <40 MODERATE, <60 ELEVATED, <80 HIGH, else CRITICAL.
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            RiskLevel::Low
        } else if score < 40.0 {
            RiskLevel::Moderate
        } else if score < 60.0 {
            RiskLevel::Elevated
        } else if score < 80.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::Elevated => "ELEVATED",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spectral summary of one category sub-vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicResult {
    /// Mean magnitude per frequency band, low to high.
    pub bands: Vec<f64>,
    /// Index of the peak-magnitude DFT bin.
    pub dominant_frequency: usize,
    /// Sum of squared magnitudes.
    pub spectral_energy: f64,
    /// Shannon entropy (nats) of the normalised magnitude distribution.
    pub entropy: f64,
}

/// Harmonic results keyed by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryHarmonics {
    pub market: HarmonicResult,
    pub operational: HarmonicResult,
    pub strategic: HarmonicResult,
    pub financial: HarmonicResult,
}

impl CategoryHarmonics {
    pub fn get(&self, category: RiskCategory) -> &HarmonicResult {
        match category {
            RiskCategory::Market => &self.market,
            RiskCategory::Operational => &self.operational,
            RiskCategory::Strategic => &self.strategic,
            RiskCategory::Financial => &self.financial,
        }
    }
}

/// Weighted risk score in [0, 100] and its label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateRiskScore {
    pub total_risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Output of [`TensorHarmonicsProcessor::process`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicsReport {
    pub harmonics: CategoryHarmonics,
    #[serde(flatten)]
    pub aggregate: AggregateRiskScore,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Decomposes risk tensors into category harmonics.
///
/// Holds a pre-planned forward FFT; the processor is immutable after
/// construction and can be shared across threads.
pub struct TensorHarmonicsProcessor {
    config: HarmonicsConfig,
    fft: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for TensorHarmonicsProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorHarmonicsProcessor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TensorHarmonicsProcessor {
    pub fn new(config: HarmonicsConfig) -> Result<Self> {
        config.validate()?;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.category_len);
        Ok(Self { config, fft })
    }

    pub fn config(&self) -> &HarmonicsConfig {
        &self.config
    }

    /// Decompose one tensor and score it.
    pub fn process(&self, tensor: &[f64]) -> Result<HarmonicsReport> {
        if tensor.len() != self.config.tensor_len {
            return Err(ActuaryError::Dimension {
                expected: self.config.tensor_len,
                actual: tensor.len(),
            });
        }
        ensure_finite(tensor, "risk tensor")?;

        let n = self.config.category_len;
        let [market, operational, strategic, financial] =
            std::array::from_fn(|i| self.analyze_category(&tensor[i * n..(i + 1) * n]));
        let harmonics = CategoryHarmonics {
            market,
            operational,
            strategic,
            financial,
        };
        let aggregate = self.aggregate(&harmonics)?;

        log::debug!(
            "harmonics: score={:.3} level={} energies=[{:.3}, {:.3}, {:.3}, {:.3}]",
            aggregate.total_risk_score,
            aggregate.risk_level,
            harmonics.market.spectral_energy,
            harmonics.operational.spectral_energy,
            harmonics.strategic.spectral_energy,
            harmonics.financial.spectral_energy,
        );

        Ok(HarmonicsReport {
            harmonics,
            aggregate,
        })
    }

    /// Process independent tensors in parallel. A malformed row yields an
    /// error in its own slot and does not affect the others.
    pub fn batch_process<T>(&self, tensors: &[T]) -> Vec<Result<HarmonicsReport>>
    where
        T: AsRef<[f64]> + Sync,
    {
        let results: Vec<Result<HarmonicsReport>> = tensors
            .par_iter()
            .map(|t| self.process(t.as_ref()))
            .collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            log::warn!("batch harmonics: {failed}/{} rows rejected", results.len());
        }
        results
    }

    /// Weighted energy blend, scaled and clamped to [0, 100].
    pub fn aggregate(&self, harmonics: &CategoryHarmonics) -> Result<AggregateRiskScore> {
        let weights = self.config.category_weights();
        let total: f64 = RiskCategory::ALL
            .iter()
            .zip(weights)
            .map(|(c, w)| w * harmonics.get(*c).spectral_energy)
            .sum();
        if !total.is_finite() {
            return Err(ActuaryError::NumericDomain(
                "weighted spectral energy overflowed".to_string(),
            ));
        }
        let total_risk_score = (total / self.config.score_scale).clamp(0.0, 100.0);
        Ok(AggregateRiskScore {
            total_risk_score,
            risk_level: RiskLevel::from_score(total_risk_score),
        })
    }

    fn analyze_category(&self, values: &[f64]) -> HarmonicResult {
        let mut buffer: Vec<Complex<f64>> =
            values.iter().map(|&x| Complex { re: x, im: 0.0 }).collect();
        self.fft.process(&mut buffer);

        let magnitudes: Vec<f64> = buffer.iter().map(|c| c.norm()).collect();
        harmonic_summary(&magnitudes, self.config.n_bands, self.config.entropy_epsilon)
    }
}

/// Summarise a magnitude spectrum: band means, peak bin, energy, entropy.
///
/// Bands are `len / n_bands` bins wide and non-overlapping; trailing bins
/// that do not fill a band are left out of the band means but still count
/// toward the peak, energy and entropy.
pub fn harmonic_summary(magnitudes: &[f64], n_bands: usize, epsilon: f64) -> HarmonicResult {
    let band_size = if n_bands == 0 {
        0
    } else {
        magnitudes.len() / n_bands
    };
    let bands: Vec<f64> = if band_size == 0 {
        vec![0.0; n_bands]
    } else {
        magnitudes
            .chunks_exact(band_size)
            .take(n_bands)
            .map(|band| band.iter().sum::<f64>() / band_size as f64)
            .collect()
    };

    let dominant_frequency = magnitudes
        .iter()
        .enumerate()
        .fold((0usize, f64::NEG_INFINITY), |best, (i, &m)| {
            if m > best.1 { (i, m) } else { best }
        })
        .0;

    let spectral_energy: f64 = magnitudes.iter().map(|m| m * m).sum();

    let total: f64 = magnitudes.iter().sum();
    let entropy = if total > 0.0 {
        -magnitudes
            .iter()
            .map(|m| {
                let p = m / total;
                p * (p + epsilon).ln()
            })
            .sum::<f64>()
    } else {
        0.0
    };

    HarmonicResult {
        bands,
        dominant_frequency,
        spectral_energy,
        entropy,
    }
}
