use actuary_core::{
    ActuaryConfig, ProjectionMetrics, RevenueProjection, RevenueProjector, Scenario,
    SensitivityEntry,
};
use serde::Serialize;

pub struct ProjectCommandConfig<'a> {
    pub config: &'a ActuaryConfig,
    pub scenario: &'a str,
    pub active_brands: Option<f64>,
    pub avg_brand_value: Option<f64>,
    pub market_multiplier: Option<f64>,
    pub risk_adjustment: Option<f64>,
    pub sensitivity: bool,
    pub output_path: Option<&'a str>,
}

#[derive(Serialize)]
struct ProjectionRun {
    metrics: ProjectionMetrics,
    projection: RevenueProjection,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<Vec<SensitivityEntry>>,
}

/// Preset metrics with any explicit overrides applied.
fn resolve_metrics(cmd: &ProjectCommandConfig) -> ProjectionMetrics {
    let preset: Scenario = cmd.scenario.parse().unwrap_or_else(|e| super::fail(e));
    let base = preset.metrics();
    ProjectionMetrics {
        active_brands: cmd.active_brands.unwrap_or(base.active_brands),
        avg_brand_value: cmd.avg_brand_value.unwrap_or(base.avg_brand_value),
        market_multiplier: cmd.market_multiplier.unwrap_or(base.market_multiplier),
        risk_adjustment: cmd.risk_adjustment.unwrap_or(base.risk_adjustment),
    }
}

pub fn print_projection(p: &RevenueProjection) {
    println!("  Base revenue:          {:>20.2}", p.base_revenue);
    println!("  Risk-adjusted revenue: {:>20.2}", p.risk_adjusted_revenue);
    println!("  Care Loop allocation:  {:>20.2}", p.care_loop_allocation);
    println!("  Net revenue:           {:>20.2}", p.net_revenue);
    println!("  Target achievement:    {:>19.2}%", p.target_achievement_percent);
    for h in &p.projections {
        println!("  {:>4}-day projection:   {:>20.2}", h.days, h.revenue);
    }
}

pub fn run(cmd: ProjectCommandConfig) {
    let projector =
        RevenueProjector::new(cmd.config.projection.clone()).unwrap_or_else(|e| super::fail(e));
    let metrics = resolve_metrics(&cmd);
    let projection = projector.project(&metrics).unwrap_or_else(|e| super::fail(e));

    println!("Revenue projection ({} preset)\n", cmd.scenario);
    print_projection(&projection);

    let sensitivity = if cmd.sensitivity {
        let entries = projector
            .sensitivity(&metrics)
            .unwrap_or_else(|e| super::fail(e));
        println!(
            "\n  Sensitivity (±{:.0}%):",
            projector.config().sensitivity_step * 100.0
        );
        for e in &entries {
            println!(
                "    {:<18} {:>18.2} .. {:>18.2}  swing {:.2}%",
                e.input, e.low_adjusted_revenue, e.high_adjusted_revenue, e.swing_percent
            );
        }
        Some(entries)
    } else {
        None
    };

    super::write_report(
        cmd.output_path,
        "projection",
        ProjectionRun {
            metrics,
            projection,
            sensitivity,
        },
    );
}
