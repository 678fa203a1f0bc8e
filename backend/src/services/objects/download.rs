//! # Object Download

use crate::error::ApiError;
use crate::object_store::{ObjectStoreError, UrlMethod};
use crate::state::AppState;
use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::io::ErrorKind;

pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ApiError> {
    let (bucket, key) = path.into_inner();
    super::authorize(&state, UrlMethod::Get, &bucket, &key, &params, None)?;

    let file_path = state.blobs.object_path(&bucket, &key)?;
    match NamedFile::open_async(&file_path).await {
        Ok(file) => Ok(file.into_response(&req)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::NotFound("Object not found")),
        Err(source) => Err(ObjectStoreError::Read { bucket, key, source }.into()),
    }
}
