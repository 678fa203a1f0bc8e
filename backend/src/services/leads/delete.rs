use super::NOT_FOUND;
use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use crm_common::model::lead::Lead;
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Lead")?;
    let table = state.leads_table();
    if state.store.get_item::<Lead>(table, &id).await?.is_none() {
        return Err(ApiError::NotFound(NOT_FOUND));
    }
    state.store.delete_item(table, &id).await?;
    info!("Lead {} deleted by {}", id, caller.subject());
    Ok(HttpResponse::NoContent().finish())
}
