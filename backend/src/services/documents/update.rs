use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::document::Document;
use log::info;
use serde_json::Value;

/// `PUT /documents/{id}`: changes type, description, tags or visibility.
pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Document")?;
    let update = validation::document::update(&body)?;
    super::owned_document(&state, &id, &caller).await?;

    let document: Document = state
        .store
        .update_item(state.documents_table(), &id, &update)
        .await?;
    info!("Document {} updated by {}", id, caller.subject());
    Ok(HttpResponse::Ok().json(document))
}
