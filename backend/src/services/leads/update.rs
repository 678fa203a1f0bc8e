//! # Lead Update
//!
//! `PUT /leads/{id}` merges the supplied fields into an existing lead. An empty
//! payload is valid and only refreshes `updatedAt`. Concurrent updates are not
//! coordinated: the last write wins field by field.

use super::NOT_FOUND;
use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::lead::Lead;
use log::info;
use serde_json::Value;

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Lead")?;
    let update = validation::lead::update(&body)?;

    let table = state.leads_table();
    if state.store.get_item::<Lead>(table, &id).await?.is_none() {
        return Err(ApiError::NotFound(NOT_FOUND));
    }
    let lead: Lead = state.store.update_item(table, &id, &update).await?;
    info!("Lead {} updated by {}", id, caller.subject());
    Ok(HttpResponse::Ok().json(lead))
}
