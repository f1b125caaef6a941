use std::sync::Arc;

use poem::{Route, http::StatusCode};
use poem_openapi::OpenApiService;

use crate::{
    domain::errors::DomainError,
    presentation::http::endpoints::root::{ApiState, endpoints},
};

pub mod endpoints;
pub mod mappers;
pub mod requests;
pub mod responses;

/// Mounts the API under `/api` and the Swagger UI at `/`.
pub fn build_app(state: Arc<ApiState>, server_url: &str) -> Route {
    let api_service = OpenApiService::new(endpoints(state), "Auto Messaging API", "0.1.0")
        .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();
    Route::new().nest("/api", api_service).nest("/", ui)
}

pub(crate) fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Other(source) => {
            tracing::error!(error = ?source, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    poem::Error::from_string(err.to_string(), status)
}
