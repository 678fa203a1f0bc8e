use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;
use crate::timestamps;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::call::Call;
use crm_common::requests::CreateCall;
use log::info;
use serde_json::Value;
use uuid::Uuid;

/// `POST /calls`. Answers `201` with the stored call.
pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let payload = validation::call::create(&body)?;
    let call = state.store.put_item(state.calls_table(), new_call(payload)).await?;
    info!(
        "Call {} ({}, {}s) recorded for agent {} by {}",
        call.id,
        call.outcome,
        call.duration,
        call.agent_id,
        caller.subject()
    );
    Ok(HttpResponse::Created().json(call))
}

fn new_call(payload: CreateCall) -> Call {
    let now = timestamps::now();
    Call {
        id: Uuid::new_v4().to_string(),
        lead_id: payload.lead_id,
        agent_id: payload.agent_id,
        direction: payload.direction,
        outcome: payload.outcome,
        start_time: payload.start_time,
        end_time: payload.end_time,
        duration: payload.duration,
        recording_url: payload.recording_url,
        recording_s3_key: payload.recording_s3_key,
        notes: payload.notes,
        tags: payload.tags,
        connect_contact_id: payload.connect_contact_id,
        queue_name: payload.queue_name,
        transferred_from: payload.transferred_from,
        transferred_to: payload.transferred_to,
        created_at: now.clone(),
        updated_at: now,
    }
}
