use hexpay_core::logging::{self, LogFormat};
use hexpay_node::{build_router, config, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Plain,
    };
    logging::try_init(format);

    let config = config::from_env()?;
    let port = config.server.port;
    let state = Arc::new(AppState::new(config)?);

    let app = build_router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("HexPay node listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
