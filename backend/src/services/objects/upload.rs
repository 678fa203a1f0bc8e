//! # Object Upload
//!
//! `PUT /objects/{bucket}/{key}` streams the request body into the object. The
//! request must carry the `Content-Type` the URL was signed for.

use crate::error::ApiError;
use crate::object_store::{ObjectStoreError, UrlMethod};
use crate::state::AppState;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use std::collections::HashMap;

pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    params: web::Query<HashMap<String, String>>,
    body: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let (bucket, key) = path.into_inner();
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    super::authorize(&state, UrlMethod::Put, &bucket, &key, &params, content_type)?;

    match state.blobs.put_object(&bucket, &key, body).await {
        Ok(_) => Ok(HttpResponse::Ok().finish()),
        Err(ObjectStoreError::TooLarge { limit }) => Err(ApiError::PayloadTooLarge(limit)),
        Err(ObjectStoreError::Body(detail)) => Err(ApiError::IncompleteUpload(detail)),
        Err(e) => Err(e.into()),
    }
}
