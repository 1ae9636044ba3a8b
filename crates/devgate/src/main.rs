//! devgate: local development reverse proxy and build output mapper.

mod config;
mod error;
mod outmap;
mod proxy;
mod routes;
mod server;

use config::GateConfig;
use routes::RouteTable;
use server::AppState;

fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().collect();
    let build_mode = args.get(1).is_some_and(|a| a == "build");

    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| std::env::var("DEVGATE_CONFIG").ok())
        .unwrap_or_else(|| "devgate.toml".to_string());

    let listen_override = args
        .iter()
        .position(|a| a == "--listen")
        .and_then(|i| args.get(i + 1).cloned());

    // Load configuration
    let mut config = GateConfig::load(&config_path)?;

    // Apply CLI overrides (take precedence over TOML and env vars)
    if let Some(listen) = listen_override {
        config.server.listen_address = listen;
    }

    // Build the tokio runtime first — tonic gRPC exporter needs a reactor context
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        // Initialize tracing (OTLP export is optional — falls back to fmt-only)
        let _tracing_guard = devgate_tracing::init_tracing(&config.tracing);

        if build_mode {
            return outmap::run_build(&config.build);
        }

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            routes = config.routes.len(),
            "Starting devgate"
        );

        run(config).await
    })
}

async fn run(config: GateConfig) -> anyhow::Result<()> {
    // Validate the route table before binding anything — ambiguous or
    // malformed routes must keep the process from starting.
    let table = RouteTable::from_config(&config.routes)?;

    for route in table.routes() {
        tracing::info!(
            prefix = %route.prefix,
            target = %route.target,
            verify_tls = route.verify_tls,
            "Route registered"
        );
    }
    if table.is_empty() {
        tracing::warn!("No routes configured, serving static files only");
    }

    let state = AppState::new(table, &config.server.static_dir)?;

    server::run(state, &config.server.listen_address).await
}
