use crate::error::ApiError;
use crate::identity::Caller;
use crate::services::require_id;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = require_id(id.into_inner(), "Call")?;
    let call = super::find(&state, &id).await?;
    super::check_agent(&call, &caller)?;
    Ok(HttpResponse::Ok().json(call))
}
