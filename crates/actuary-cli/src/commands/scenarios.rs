use actuary_core::{ActuaryConfig, RevenueProjector};

pub fn run(config: &ActuaryConfig, output_path: Option<&str>) {
    let projector =
        RevenueProjector::new(config.projection.clone()).unwrap_or_else(|e| super::fail(e));
    let results = projector.scenario_sweep().unwrap_or_else(|e| super::fail(e));

    println!("Scenario sweep\n");
    println!(
        "  {:<13} {:>18} {:>18} {:>18} {:>9}",
        "Scenario", "Adjusted", "Care Loop", "Net", "Target %"
    );
    println!("  {}", "-".repeat(80));
    for r in &results {
        let p = &r.projection;
        println!(
            "  {:<13} {:>18.2} {:>18.2} {:>18.2} {:>9.2}",
            r.scenario.name(),
            p.risk_adjusted_revenue,
            p.care_loop_allocation,
            p.net_revenue,
            p.target_achievement_percent
        );
    }

    super::write_report(output_path, "scenarios", &results);
}
