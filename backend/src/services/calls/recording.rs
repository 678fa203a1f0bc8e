//! # Call Recording URL
//!
//! `GET /calls/{id}/recording` returns a pre-signed `GET` URL for the recording
//! object in the recordings bucket. A call without a recording answers `404` before
//! ownership is checked.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use crm_common::responses::RecordingUrlResponse;

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Call")?;
    let call = super::find(&state, &id).await?;
    let Some(key) = call.recording_s3_key.as_deref() else {
        return Err(ApiError::NotFound("Call has no recording"));
    };
    super::check_agent(&call, &caller)?;

    let recording_url = state
        .blobs
        .download_url(&state.config.object_store.recordings_bucket, key)?;
    Ok(HttpResponse::Ok().json(RecordingUrlResponse {
        call_id: call.id.clone(),
        recording_url,
        call,
    }))
}
