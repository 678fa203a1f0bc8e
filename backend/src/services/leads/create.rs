//! # Lead Creation
//!
//! `POST /leads`. The server owns `id`, `createdAt` and `updatedAt`; any values for
//! them in the payload are ignored. The stored lead is returned with `201 Created`.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;
use crate::timestamps;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::lead::Lead;
use crm_common::requests::CreateLead;
use log::info;
use serde_json::Value;
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let payload = validation::lead::create(&body)?;
    let lead = state
        .store
        .put_item(state.leads_table(), new_lead(payload))
        .await?;
    info!("Lead {} created by {}", lead.id, caller.subject());
    Ok(HttpResponse::Created().json(lead))
}

fn new_lead(payload: CreateLead) -> Lead {
    let now = timestamps::now();
    Lead {
        id: Uuid::new_v4().to_string(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone: payload.phone,
        company: payload.company,
        status: payload.status,
        source: payload.source,
        notes: payload.notes,
        assigned_to: payload.assigned_to,
        created_at: now.clone(),
        updated_at: now,
        last_contacted_at: payload.last_contacted_at,
        estimated_value: payload.estimated_value,
        tags: payload.tags,
    }
}
