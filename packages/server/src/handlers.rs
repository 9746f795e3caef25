//! HTTP handler functions for the incident map API.

use actix_web::{HttpResponse, web};
use incident_map_choropleth::ChoroplethError;
use incident_map_server_models::{
    ApiDataset, ApiError, ApiHealth, ChoroplethQueryParams, ResponseFormat,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/datasets`
///
/// Lists the loaded dataset and its years.
pub async fn datasets(state: web::Data<AppState>) -> HttpResponse {
    let context = &state.context;
    HttpResponse::Ok().json(vec![ApiDataset::new(context.dataset(), context.years())])
}

/// `GET /api/choropleth`
///
/// Filters, aggregates and classifies one year's incidents. Returns the
/// choropleth view, or a `GeoJSON` `FeatureCollection` with
/// `format=geojson`.
pub async fn choropleth(
    state: web::Data<AppState>,
    params: web::Query<ChoroplethQueryParams>,
) -> HttpResponse {
    let request = params.to_request();

    let result = match params.format {
        ResponseFormat::Json => state
            .context
            .choropleth(&request)
            .map(|view| HttpResponse::Ok().json(view)),
        ResponseFormat::Geojson => state
            .context
            .choropleth_geojson(&request)
            .map(|collection| HttpResponse::Ok().json(collection)),
    };

    result.unwrap_or_else(|e| error_response(&e))
}

fn error_response(e: &ChoroplethError) -> HttpResponse {
    match e {
        ChoroplethError::UnknownVintage { .. } | ChoroplethError::NoVintages => {
            HttpResponse::NotFound().json(ApiError {
                error: e.to_string(),
            })
        }
        ChoroplethError::Ingest(_) => {
            log::error!("Failed to build choropleth: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to build choropleth".to_string(),
            })
        }
    }
}
