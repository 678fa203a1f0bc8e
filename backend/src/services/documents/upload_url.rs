//! # Document Upload URL
//!
//! `POST /documents/upload-url` creates the document record and returns a pre-signed
//! `PUT` URL for its object. The record exists as soon as this returns; it does not
//! wait for the client to finish the upload.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;
use crate::timestamps;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::document::Document;
use crm_common::requests::UploadUrlRequest;
use crm_common::responses::UploadUrlResponse;
use log::info;
use serde_json::Value;
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let request = validation::document::upload_url(&body)?;
    let document = new_document(request, &caller);

    let upload_url = state.blobs.upload_url(
        &state.config.object_store.documents_bucket,
        &document.s3_key,
        &document.file_type,
    )?;
    let document = state.store.put_item(state.documents_table(), document).await?;
    info!(
        "Document {} ({} bytes) registered for lead {} by {}",
        document.id,
        document.file_size,
        document.lead_id,
        caller.subject()
    );

    Ok(HttpResponse::Ok().json(UploadUrlResponse {
        document_id: document.id.clone(),
        upload_url,
        document,
    }))
}

fn new_document(request: UploadUrlRequest, caller: &Caller) -> Document {
    let id = Uuid::new_v4().to_string();
    let now = timestamps::now();
    Document {
        s3_key: format!("{}/{}/{}", request.lead_id, id, request.file_name),
        id,
        lead_id: request.lead_id,
        file_name: request.file_name,
        file_type: request.file_type,
        file_size: request.file_size,
        document_type: request.document_type,
        description: request.description,
        uploaded_by: caller.subject().to_string(),
        uploaded_at: now.clone(),
        updated_at: now,
        tags: request.tags,
        is_public: request.is_public,
    }
}
