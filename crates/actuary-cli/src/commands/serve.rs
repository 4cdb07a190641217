use actuary_core::ActuaryConfig;

pub fn run(config: ActuaryConfig, host: &str, port: u16) {
    let base = format!("http://{host}:{port}");

    println!("Actuary Server v{}", actuary_core::VERSION);
    println!("   {base}");
    println!("   {} oracles, {} qubits", config.oracle.n_oracles, config.model.n_qubits);
    println!();
    println!("   Endpoints:");
    println!("     GET  /                         API index (try: curl {base})");
    println!("     GET  /health                   Health check");
    println!("     POST /api/v1/harmonics         Risk tensor harmonics");
    println!("     POST /api/v1/predict           Statevector prediction");
    println!("     POST /api/v1/train             Parameter-shift training");
    println!("     POST /api/v1/consensus         Oracle consensus cycle");
    println!("     POST /api/v1/consensus/actual  Feed back a ground-truth value");
    println!("     GET  /api/v1/divergence        Divergence statistics");
    println!("     POST /api/v1/projection        Revenue projection");
    println!("     GET  /api/v1/scenarios         Scenario sweep");
    println!();
    println!("   Example:");
    println!(
        "     curl -X POST {base}/api/v1/consensus -H 'content-type: application/json' -d '{{\"market_data\": [0.4, 0.6]}}'"
    );
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| super::fail(e));
    if let Err(e) = rt.block_on(actuary_server::run_server(config, host, port)) {
        super::fail(e);
    }
}
