//! Standalone Cardforge server with in-memory storage.
//!
//! Configuration comes from the environment:
//! - `CARDFORGE_BIND`: listen address (default `127.0.0.1:4747`)
//! - `CARDFORGE_WELCOME`: the post-handshake server notice
//! - `RUST_LOG`: log filter (default `info`)

use cardforge::prelude::*;

#[tokio::main]
async fn main() -> Result<(), CardforgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var("CARDFORGE_BIND").unwrap_or_else(|_| "127.0.0.1:4747".to_owned());

    let mut builder = CardforgeServer::builder().bind(&bind);
    if let Ok(welcome) = std::env::var("CARDFORGE_WELCOME") {
        builder = builder.welcome(&welcome);
    }

    let server = builder.build(MemoryStore::new()).await?;
    tracing::info!(%bind, "cardforged listening");
    server.run().await
}
