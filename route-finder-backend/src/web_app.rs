//! Main web app module containing the route search endpoints.

use std::sync::Arc;

use actix_web::{get, http::StatusCode, web, HttpResponse, Responder, ResponseError};
use log::{error, info};
use serde::Deserialize;
use thiserror::Error;

use crate::route_store::{Direction, RouteStore, StoreError};
use crate::router::find_cheapest_routes;

/// Shared handler state, the only thing living across requests
pub struct AppState {
    pub store: Arc<dyn RouteStore>,
}

#[derive(Deserialize)]
pub struct CheapestRoutesQuery {
    origin: Option<String>,
    destination: Option<String>,
}

#[derive(Deserialize)]
pub struct DirectRoutesQuery {
    origin: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Error searching for cheapest routes")]
    Storage(StoreError),
    #[error("Error fetching routes data")]
    DirectRoutes(StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::DirectRoutes(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

/// Treats empty parameters the same as absent ones
fn required(param: &Option<String>) -> Option<&str> {
    param.as_deref().map(str::trim).filter(|p| !p.is_empty())
}

/// Endpoint returning the cheapest itineraries between two airports
#[get("/cheapestRoutes")]
pub async fn cheapest_routes(
    state: web::Data<AppState>,
    query: web::Query<CheapestRoutesQuery>,
) -> Result<impl Responder, ApiError> {
    let (Some(origin), Some(destination)) = (required(&query.origin), required(&query.destination))
    else {
        return Err(ApiError::BadRequest(
            "Origin and destination IATA codes are required",
        ));
    };

    let edges = state.store.fetch_all_edges().await.map_err(|e| {
        error!("Error in /cheapestRoutes endpoint: {:?}", e);
        ApiError::Storage(e)
    })?;

    let (origin, destination) = (origin.to_uppercase(), destination.to_uppercase());
    let routes = find_cheapest_routes(&edges, &origin, &destination);
    info!(
        "Found {} routes from {} to {} over {} edges",
        routes.len(),
        origin,
        destination,
        edges.len()
    );

    Ok(HttpResponse::Ok().json(routes))
}

/// Endpoint listing direct routes arriving at or leaving an airport
#[get("/directRoutes")]
pub async fn direct_routes(
    state: web::Data<AppState>,
    query: web::Query<DirectRoutesQuery>,
) -> Result<impl Responder, ApiError> {
    let Some(origin) = required(&query.origin) else {
        return Err(ApiError::BadRequest("Origin IATA code is required"));
    };
    let Some(direction) = required(&query.direction) else {
        return Err(ApiError::BadRequest("Direction is required"));
    };

    let direction = match direction.to_lowercase().as_str() {
        "to" => Direction::To,
        "from" => Direction::From,
        _ => return Err(ApiError::BadRequest("Invalid direction")),
    };

    let routes = state
        .store
        .fetch_direct_routes(&origin.to_uppercase(), direction)
        .await
        .map_err(|e| {
            error!("Error in /directRoutes endpoint: {:?}", e);
            ApiError::DirectRoutes(e)
        })?;

    Ok(HttpResponse::Ok().json(routes))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(cheapest_routes).service(direct_routes);
}
