mod server;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use airwave_api::AppState;
use airwave_core::{bootstrap::load_config, logging, MemoryEdgeCache};

use server::AirwaveServer;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load and validate configuration
    let config = load_config()?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("Airwave edge proxy starting...");
    info!("HTTP address: {}", config.http_address());
    match &config.server.public_origin {
        Some(origin) => info!("Public origin: {}", origin),
        None => info!("Public origin: derived from request headers"),
    }

    // 3. Edge cache
    let cache = Arc::new(MemoryEdgeCache::new(config.cache.max_capacity));
    info!(
        "Edge cache initialized (capacity {}, master TTL {}s, segment TTL {}s, coalescing {})",
        config.cache.max_capacity,
        config.cache.master_playlist_ttl_seconds,
        config.cache.segment_ttl_seconds,
        config.cache.coalesce_misses
    );

    // 4. Registry, origin adapters and shared state
    let state = AppState::from_config(&config, cache)?;
    if state.registry.is_empty() {
        warn!("No channels configured; every stream request will be rejected");
    }
    for (family, ids) in state.registry.by_family() {
        info!("{} channels: {}", family, ids.join(", "));
    }

    // 5. Serve until shutdown
    AirwaveServer::new(config, state).run().await
}
