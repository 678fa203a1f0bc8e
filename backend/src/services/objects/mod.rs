//! # Object Service Module
//!
//! Routes under `/objects`, the target of the pre-signed URLs that `object_store`
//! issues when `public_base_url` points back at this service. The signed query is the
//! only credential: no caller identity is read, and a URL that fails verification
//! answers `403`.
//!
//! ## Registered Routes
//!
//! - `PUT /objects/{bucket}/{key}` (`upload`): stores the request body as the object.
//! - `GET /objects/{bucket}/{key}` (`download`): returns the object.

mod download;
mod upload;

use crate::error::ApiError;
use crate::object_store::UrlMethod;
use crate::state::AppState;
use actix_web::web::{get, put, scope};
use actix_web::Scope;
use log::debug;
use std::collections::HashMap;

const API_PATH: &str = "/objects";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/{bucket}/{key:.*}", put().to(upload::process))
        .route("/{bucket}/{key:.*}", get().to(download::process))
}

fn authorize(
    state: &AppState,
    method: UrlMethod,
    bucket: &str,
    key: &str,
    params: &HashMap<String, String>,
    content_type: Option<&str>,
) -> Result<(), ApiError> {
    state
        .blobs
        .verify(method, bucket, key, params, content_type)
        .map_err(|rejection| {
            debug!("Refused {:?} on {}/{}: {}", method, bucket, key, rejection);
            ApiError::Forbidden
        })
}
