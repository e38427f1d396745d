use std::error::Error;

use greet_mesh::{WorldConfig, world_router, init_tracing, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = WorldConfig::load()?;
    serve("world-service", config.port, world_router(config)).await?;
    Ok(())
}
