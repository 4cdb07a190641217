//! Revenue and Care-Loop projection with scenario and sensitivity analysis.

use serde::{Deserialize, Serialize};

use crate::config::ProjectionConfig;
use crate::error::{ActuaryError, Result};

/// Inputs to a revenue projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionMetrics {
    pub active_brands: f64,
    #[serde(alias = "avg_value")]
    pub avg_brand_value: f64,
    pub market_multiplier: f64,
    pub risk_adjustment: f64,
}

impl ProjectionMetrics {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("active_brands", self.active_brands),
            ("avg_brand_value", self.avg_brand_value),
            ("market_multiplier", self.market_multiplier),
            ("risk_adjustment", self.risk_adjustment),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ActuaryError::NumericDomain(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Compounded adjusted revenue at one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizonProjection {
    pub days: u32,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueProjection {
    pub base_revenue: f64,
    pub risk_adjusted_revenue: f64,
    pub care_loop_allocation: f64,
    pub net_revenue: f64,
    /// risk_adjusted_revenue / target_revenue * 100.
    pub target_achievement_percent: f64,
    pub projections: Vec<HorizonProjection>,
}

/// Named input presets for scenario sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Optimistic,
    Base,
    Conservative,
    Pessimistic,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Optimistic,
        Scenario::Base,
        Scenario::Conservative,
        Scenario::Pessimistic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Optimistic => "optimistic",
            Scenario::Base => "base",
            Scenario::Conservative => "conservative",
            Scenario::Pessimistic => "pessimistic",
        }
    }

    pub fn metrics(self) -> ProjectionMetrics {
        let (active_brands, avg_brand_value, market_multiplier, risk_adjustment) = match self {
            Scenario::Optimistic => (12_000.0, 135_000.0, 1.35, 0.98),
            Scenario::Base => (10_000.0, 120_000.0, 1.2, 0.95),
            Scenario::Conservative => (8_500.0, 110_000.0, 1.1, 0.90),
            Scenario::Pessimistic => (7_000.0, 95_000.0, 1.0, 0.85),
        };
        ProjectionMetrics {
            active_brands,
            avg_brand_value,
            market_multiplier,
            risk_adjustment,
        }
    }
}

impl std::str::FromStr for Scenario {
    type Err = ActuaryError;

    fn from_str(s: &str) -> Result<Self> {
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ActuaryError::Configuration(format!("unknown scenario: {s}")))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub metrics: ProjectionMetrics,
    pub projection: RevenueProjection,
}

/// Effect of moving one input by ±`sensitivity_step`.
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityEntry {
    pub input: String,
    pub low_adjusted_revenue: f64,
    pub high_adjusted_revenue: f64,
    /// (high - low) / baseline adjusted revenue * 100.
    pub swing_percent: f64,
}

#[derive(Debug, Clone)]
pub struct RevenueProjector {
    config: ProjectionConfig,
}

impl RevenueProjector {
    pub fn new(config: ProjectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn project(&self, metrics: &ProjectionMetrics) -> Result<RevenueProjection> {
        metrics.validate()?;
        let base_revenue = metrics.active_brands * metrics.avg_brand_value * metrics.market_multiplier;
        if !base_revenue.is_finite() {
            return Err(ActuaryError::NumericDomain(
                "base revenue overflows for these inputs".to_string(),
            ));
        }
        let adjusted = base_revenue * metrics.risk_adjustment;
        let care_loop_allocation = adjusted * self.config.care_loop_rate;
        let net_revenue = adjusted - care_loop_allocation;

        let growth = 1.0 + self.config.daily_growth_rate;
        let projections: Vec<HorizonProjection> = self
            .config
            .horizons_days
            .iter()
            .map(|&days| HorizonProjection {
                days,
                revenue: adjusted * growth.powf(f64::from(days)),
            })
            .collect();
        if let Some(h) = projections.iter().find(|h| !h.revenue.is_finite()) {
            return Err(ActuaryError::NumericDomain(format!(
                "{}-day projection overflows",
                h.days
            )));
        }

        log::debug!("projection: base={base_revenue:.2} adjusted={adjusted:.2}");
        Ok(RevenueProjection {
            base_revenue,
            risk_adjusted_revenue: adjusted,
            care_loop_allocation,
            net_revenue,
            target_achievement_percent: adjusted / self.config.target_revenue * 100.0,
            projections,
        })
    }

    /// Project every preset in [`Scenario::ALL`].
    pub fn scenario_sweep(&self) -> Result<Vec<ScenarioResult>> {
        Scenario::ALL
            .into_iter()
            .map(|scenario| {
                let metrics = scenario.metrics();
                Ok(ScenarioResult {
                    scenario,
                    metrics,
                    projection: self.project(&metrics)?,
                })
            })
            .collect()
    }

    pub fn sensitivity(&self, metrics: &ProjectionMetrics) -> Result<Vec<SensitivityEntry>> {
        let baseline = self.project(metrics)?.risk_adjusted_revenue;
        let step = self.config.sensitivity_step;

        SENSITIVITY_INPUTS
            .into_iter()
            .map(|input| {
                let shifted = |factor: f64| -> Result<f64> {
                    let m = scaled(metrics, input, factor);
                    Ok(self.project(&m)?.risk_adjusted_revenue)
                };
                let low = shifted(1.0 - step)?;
                let high = shifted(1.0 + step)?;
                let swing_percent = if baseline > 0.0 {
                    (high - low) / baseline * 100.0
                } else {
                    0.0
                };
                Ok(SensitivityEntry {
                    input: input.to_string(),
                    low_adjusted_revenue: low,
                    high_adjusted_revenue: high,
                    swing_percent,
                })
            })
            .collect()
    }
}

const SENSITIVITY_INPUTS: [&str; 4] = [
    "active_brands",
    "avg_brand_value",
    "market_multiplier",
    "risk_adjustment",
];

fn scaled(metrics: &ProjectionMetrics, input: &str, factor: f64) -> ProjectionMetrics {
    let mut m = *metrics;
    match input {
        "active_brands" => m.active_brands *= factor,
        "avg_brand_value" => m.avg_brand_value *= factor,
        "market_multiplier" => m.market_multiplier *= factor,
        _ => m.risk_adjustment *= factor,
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector() -> RevenueProjector {
        RevenueProjector::new(ProjectionConfig::default()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= b.abs() * 1e-9
    }

    #[test]
    fn base_scenario_figures() {
        let p = projector().project(&Scenario::Base.metrics()).unwrap();
        assert!(close(p.base_revenue, 1_440_000_000.0));
        assert!(close(p.risk_adjusted_revenue, 1_368_000_000.0));
        assert!(close(p.care_loop_allocation, 205_200_000.0));
        assert!(close(p.net_revenue, 1_162_800_000.0));
        assert_eq!(p.care_loop_allocation, p.risk_adjusted_revenue * 0.15);
        assert!(close(
            p.net_revenue + p.care_loop_allocation,
            p.risk_adjusted_revenue
        ));
    }

    #[test]
    fn horizons_compound_daily() {
        let p = projector().project(&Scenario::Base.metrics()).unwrap();
        let days: Vec<u32> = p.projections.iter().map(|h| h.days).collect();
        assert_eq!(days, vec![30, 90, 365]);
        let expected = p.risk_adjusted_revenue * 1.0012_f64.powi(365);
        assert!(close(p.projections[2].revenue, expected));
        assert!(p.projections.windows(2).all(|w| w[0].revenue < w[1].revenue));
    }

    #[test]
    fn negative_inputs_rejected() {
        let mut m = Scenario::Base.metrics();
        m.active_brands = -1.0;
        assert!(matches!(
            projector().project(&m),
            Err(ActuaryError::NumericDomain(_))
        ));
        let mut m = Scenario::Base.metrics();
        m.avg_brand_value = f64::NAN;
        assert!(projector().project(&m).is_err());
    }

    #[test]
    fn overflowing_inputs_rejected() {
        let m = ProjectionMetrics {
            active_brands: 1e200,
            avg_brand_value: 1e200,
            market_multiplier: 1.0,
            risk_adjustment: 1.0,
        };
        assert!(matches!(
            projector().project(&m),
            Err(ActuaryError::NumericDomain(_))
        ));
    }

    #[test]
    fn long_horizons_compound_forward() {
        let p = RevenueProjector::new(ProjectionConfig {
            daily_growth_rate: 0.0,
            horizons_days: vec![u32::MAX],
            ..Default::default()
        })
        .unwrap()
        .project(&Scenario::Base.metrics())
        .unwrap();
        assert!(close(p.projections[0].revenue, p.risk_adjusted_revenue));

        let err = RevenueProjector::new(ProjectionConfig {
            horizons_days: vec![u32::MAX],
            ..Default::default()
        })
        .unwrap()
        .project(&Scenario::Base.metrics())
        .unwrap_err();
        assert!(matches!(err, ActuaryError::NumericDomain(_)));
    }

    #[test]
    fn scenarios_are_ordered() {
        let sweep = projector().scenario_sweep().unwrap();
        assert_eq!(sweep.len(), 4);
        let revenue: Vec<f64> = sweep
            .iter()
            .map(|r| r.projection.risk_adjusted_revenue)
            .collect();
        assert!(revenue.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn scenario_parses_case_insensitively() {
        assert_eq!("Optimistic".parse::<Scenario>().unwrap(), Scenario::Optimistic);
        assert!("bullish".parse::<Scenario>().is_err());
    }

    #[test]
    fn multiplicative_inputs_swing_symmetrically() {
        let entries = projector().sensitivity(&Scenario::Base.metrics()).unwrap();
        assert_eq!(entries.len(), 4);
        for e in &entries {
            assert!((e.swing_percent - 20.0).abs() < 1e-9, "{}: {}", e.input, e.swing_percent);
            assert!(e.low_adjusted_revenue < e.high_adjusted_revenue);
        }
    }

    #[test]
    fn metrics_accept_avg_value_alias() {
        let m: ProjectionMetrics = serde_json::from_str(
            r#"{"active_brands":1,"avg_value":2,"market_multiplier":1,"risk_adjustment":1}"#,
        )
        .unwrap();
        assert_eq!(m.avg_brand_value, 2.0);
    }
}
