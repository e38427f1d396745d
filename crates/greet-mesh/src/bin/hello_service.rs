use std::error::Error;

use greet_mesh::{HelloConfig, hello_router, init_tracing, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = HelloConfig::load()?;
    serve("hello-service", config.port, hello_router(config)).await?;
    Ok(())
}
