use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::call::Call;
use log::info;
use serde_json::Value;

/// `PUT /calls/{id}/notes`: only `notes` and `tags` of a call can change.
pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Call")?;
    let update = validation::call::update_notes(&body)?;
    let call = super::find(&state, &id).await?;
    super::check_agent(&call, &caller)?;

    let call: Call = state.store.update_item(state.calls_table(), &id, &update).await?;
    info!("Notes of call {} updated by {}", id, caller.subject());
    Ok(HttpResponse::Ok().json(call))
}
