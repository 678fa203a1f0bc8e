//! # Health Check
//!
//! `GET /health` answers `200` with the current time while the process is serving.
//! It needs no identity, so load balancers can probe it directly.

use crate::timestamps;
use actix_web::web::{get, scope};
use actix_web::{HttpResponse, Scope};
use crm_common::responses::HealthResponse;

const API_PATH: &str = "/health";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

async fn process() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: timestamps::now(),
    })
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::*;
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use crm_common::responses::HealthResponse;

    #[actix_web::test]
    async fn health_needs_no_identity() {
        let (state, _blobs) = test_state();
        let app = test_app!(state);
        let response = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body: HealthResponse = read_json(response).await;
        assert_eq!(body.status, "healthy");
    }
}
