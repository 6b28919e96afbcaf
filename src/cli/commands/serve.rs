//! HTTP API server.

use crate::api::{router, AppState};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, mut settings: Settings) -> Result<()> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    let state = AppState::from_settings(&settings)?;
    let app = router(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Trellis API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Database", &settings.database.url);
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Divide", "GET  /divide/{numerator}/{denominator}");
    Output::kv("Fibonacci", "GET  /fibonacci/{n}");
    Output::kv("Create Item", "POST /items/");
    Output::kv("List Items", "GET  /items/?skip=0&limit=100");
    Output::kv("Get Item", "GET  /items/{item_id}");
    Output::kv("Docs Agent", "POST /agent/query");
    Output::kv("Browser Agent", "POST /mcp/query");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Output::info("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}
