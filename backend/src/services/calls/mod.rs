//! # Call Service Module
//!
//! Routes under `/calls`. A call belongs to the agent who handled it (`agentId`);
//! agents list, read and annotate only their own calls.
//!
//! ## Registered Routes
//!
//! - `POST /calls` (`create`): stores a call record, usually posted by the telephony
//!   integration once the call has ended. Answers `201`.
//! - `GET /calls` (`list`): the caller's calls, filtered and paginated.
//! - `GET /calls/{id}` (`get`): one call, agent only.
//! - `GET /calls/{id}/recording` (`recording`): pre-signed URL for the recording.
//! - `PUT /calls/{id}/notes` (`notes`): replaces notes and tags.

mod create;
mod get;
mod list;
mod notes;
mod recording;

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;
use actix_web::web::{get, post, put, scope};
use actix_web::Scope;
use crm_common::model::call::Call;

const API_PATH: &str = "/calls";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list::process))
        .route("/{id}", get().to(get::process))
        .route("/{id}/recording", get().to(recording::process))
        .route("/{id}/notes", put().to(notes::process))
}

async fn find(state: &AppState, id: &str) -> Result<Call, ApiError> {
    state
        .store
        .get_item(state.calls_table(), id)
        .await?
        .ok_or(ApiError::NotFound("Call not found"))
}

fn check_agent(call: &Call, caller: &Caller) -> Result<(), ApiError> {
    if caller.owns(&call.agent_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
