use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use crm_common::responses::DownloadUrlResponse;

/// `GET /documents/{id}/download-url`. Public documents may be fetched by anyone.
pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Document")?;
    let document = super::find(&state, &id).await?;
    if !document.is_public && !caller.owns(&document.uploaded_by) {
        return Err(ApiError::Forbidden);
    }

    let download_url = state
        .blobs
        .download_url(&state.config.object_store.documents_bucket, &document.s3_key)?;
    Ok(HttpResponse::Ok().json(DownloadUrlResponse {
        document_id: document.id.clone(),
        download_url,
        document,
    }))
}
