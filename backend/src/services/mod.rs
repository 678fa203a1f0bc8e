//! # HTTP Services
//!
//! Registers every API scope on the actix `App`. Each resource area lives in its own
//! module exposing `configure_routes()`, with one sub-module per operation whose
//! `process` function is the actix handler.
//!
//! Handlers return `Result<HttpResponse, ApiError>`; error bodies are produced by
//! `ApiError`'s `ResponseError` impl, so a handler only decides the success shape.

/// Builds a test service with the full API mounted over the given `AppState`.
#[cfg(test)]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap($crate::services::envelope_headers())
                .configure(|cfg| $crate::services::configure(cfg, $state)),
        )
        .await
    };
}

pub mod calls;
pub mod documents;
pub mod health;
pub mod leads;
pub mod objects;

use crate::error::ApiError;
use crate::state::AppState;
use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;

/// Registers the shared state, the extractor configuration and every API scope.
pub fn configure(cfg: &mut web::ServiceConfig, state: AppState) {
    let json_limit = state.config.server.json_limit;
    cfg.app_data(web::Data::new(state))
        .app_data(
            web::JsonConfig::default()
                .limit(json_limit)
                .content_type_required(false)
                .error_handler(|err, _req| ApiError::MalformedBody(err.to_string()).into()),
        )
        .app_data(
            web::QueryConfig::default().error_handler(|err, _req| {
                ApiError::invalid_query(vec![crm_common::responses::FieldViolation::new(
                    "query",
                    err.to_string(),
                )])
                .into()
            }),
        )
        .service(health::configure_routes())
        .service(leads::configure_routes())
        .service(documents::configure_routes())
        .service(calls::configure_routes())
        .service(objects::configure_routes());
}

/// Headers every response carries, errors included.
pub fn envelope_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::CONTENT_TYPE, "application/json"))
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"))
}

/// The `{id}` path segment, rejecting a blank one.
pub fn require_id(raw: String, entity: &'static str) -> Result<String, ApiError> {
    let id = raw.trim();
    if id.is_empty() {
        Err(ApiError::MissingParameter(entity))
    } else {
        Ok(id.to_string())
    }
}
