//! # Document Deletion
//!
//! Two steps against two stores, with no transaction spanning them: the object is
//! removed first, then the metadata record. If the second step fails the record
//! outlives its object; that is logged with the record id so it can be cleaned up.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use log::{info, warn};

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Document")?;
    let document = super::owned_document(&state, &id, &caller).await?;

    state
        .blobs
        .delete_object(&state.config.object_store.documents_bucket, &document.s3_key)
        .await?;
    if let Err(e) = state.store.delete_item(state.documents_table(), &id).await {
        warn!(
            "Object {} deleted but metadata for document {} remains: {}",
            document.s3_key, id, e
        );
        return Err(e.into());
    }

    info!("Document {} deleted by {}", id, caller.subject());
    Ok(HttpResponse::NoContent().finish())
}
