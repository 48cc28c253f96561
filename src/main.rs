//! IIIF ImageX - an IIIF Image API gateway for ERDAS ImageX.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iiif_imagex::{
    backend::{DimensionCache, ImageXClient},
    config::Config,
    gateway::IiifService,
    server::create_router,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let client = match ImageXClient::new(
        &config.backend_url,
        &config.backend_path,
        config.backend_timeout(),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create backend client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("IIIF ImageX v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Backend: {}", client.endpoint());
    info!("  Backend timeout: {}s", config.backend_timeout);
    info!("  Service id base: {}{}", config.base_url, config.prefix);
    info!(
        "  Tiles: {}px, scale factors {:?}",
        config.tile_size, config.scale_factors
    );
    info!("  Max image size: {}px", config.max_image_size);
    match config.dimension_cache_capacity {
        Some(capacity) => info!("  Dimension cache: {} identifiers", capacity),
        None => info!("  Dimension cache: unbounded"),
    }

    let dimensions = config
        .dimension_cache_capacity
        .map(DimensionCache::with_capacity)
        .unwrap_or_default();

    let service =
        IiifService::with_dimension_cache(Arc::new(client), dimensions, config.iiif_settings());
    let router = create_router(service, config.router_config());

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}{}/<identifier>/info.json", addr, config.prefix);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "iiif_imagex=debug,tower_http=debug"
    } else {
        "iiif_imagex=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
