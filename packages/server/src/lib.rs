#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident map.
//!
//! The dataset named by `INCIDENT_MAP_DATASET` is loaded into a
//! [`MapContext`] once at startup; every request then reads from it.
//! Rendering the map itself is left to the client, which receives either
//! the choropleth view or a `GeoJSON` `FeatureCollection`.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use incident_map_choropleth::MapContext;
use incident_map_ingest::{dataset, paths};

/// Dataset loaded when `INCIDENT_MAP_DATASET` is unset.
pub const DEFAULT_DATASET: &str = "edmonton";

/// Shared application state.
pub struct AppState {
    /// The loaded dataset, read-only after startup.
    pub context: Arc<MapContext>,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/datasets", web::get().to(handlers::datasets))
            .route("/choropleth", web::get().to(handlers::choropleth)),
    );
}

/// Starts the incident map API server.
///
/// Loads the configured dataset from the data directory and starts the
/// Actix-Web HTTP server. This is a regular async function; the caller
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded, or
/// if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let dataset_id =
        std::env::var("INCIDENT_MAP_DATASET").unwrap_or_else(|_| DEFAULT_DATASET.to_string());
    let data_dir = paths::data_dir();

    log::info!("Loading dataset {dataset_id} from {}...", data_dir.display());
    let definition = dataset(&dataset_id).map_err(std::io::Error::other)?;
    let context = MapContext::load(definition, &data_dir).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState {
        context: Arc::new(context),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
