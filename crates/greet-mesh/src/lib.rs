#![forbid(unsafe_code)]

//! Three small HTTP services that compose a greeting.
//!
//! - `hello-service` answers `GET /greet` with `{ "greeting": GREETING }`.
//! - `world-service` answers `GET /name` with `{ "name": NAME }`.
//! - `gateway` answers `GET /hello-world` by querying both concurrently and
//!   joining the parts: `{ "message": "Hello World!" }`. Any upstream failure
//!   becomes a 500 with `{ "error": ... }`.
//!
//! Every service also serves `GET /health` → `ok`.
//!
//! # Setup
//!
//! ```sh
//! RUST_LOG=info cargo run -p greet-mesh --bin hello-service
//! RUST_LOG=info cargo run -p greet-mesh --bin world-service
//! RUST_LOG=info cargo run -p greet-mesh --bin gateway
//! curl localhost:3002/hello-world
//! ```

use axum::Router;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;

pub use config::{ConfigError, GatewayConfig, HelloConfig, WorldConfig};
pub use error::GatewayError;
pub use routes::{GatewayState, gateway_router, hello_router, world_router};

/// Install the `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore a second installation attempt.
    let _ = fmt().with_env_filter(filter).try_init();
}

/// Serve `app` on `0.0.0.0:port` until Ctrl+C or SIGTERM.
pub async fn serve(service: &str, port: u16, app: Router) -> std::io::Result<()> {
    let address = format!("0.0.0.0:{port}");
    info!("Binding {service} to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("{service} listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("{service} shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
