use std::error::Error;

use greet_mesh::{GatewayConfig, GatewayState, gateway_router, init_tracing, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = GatewayConfig::load()?;
    let port = config.port;
    let state = GatewayState::new(config)?;
    serve("gateway", port, gateway_router(state)).await?;
    Ok(())
}
