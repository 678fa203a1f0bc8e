//! # Call Listing
//!
//! `GET /calls?leadId&agentId&direction&outcome&fromDate&toDate&minDuration&maxDuration&hasRecording&limit&nextToken`
//!
//! `fromDate`/`toDate` bound `startTime`, `minDuration`/`maxDuration` bound
//! `duration` (seconds), and `hasRecording` tests for a recording object key.
//! Whatever the filters, only calls handled by the caller are returned.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::listing::{self, Access, Criterion, ListSpec};
use crate::state::AppState;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::call::Call;
use crm_common::responses::CallList;
use std::collections::HashMap;

pub const CALL_LISTING: ListSpec = ListSpec {
    criteria: &[
        Criterion::Exact {
            param: "agentId",
            attribute: "agentId",
        },
        Criterion::Exact {
            param: "direction",
            attribute: "direction",
        },
        Criterion::Exact {
            param: "outcome",
            attribute: "outcome",
        },
        Criterion::Range {
            lower: "fromDate",
            upper: "toDate",
            attribute: "startTime",
        },
        Criterion::Range {
            lower: "minDuration",
            upper: "maxDuration",
            attribute: "duration",
        },
        Criterion::Presence {
            param: "hasRecording",
            attribute: "recordingS3Key",
        },
    ],
    access: Access::Owner {
        attribute: "agentId",
    },
};

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ApiError> {
    let query = validation::call::query(&params)?;
    let page = listing::fetch_page::<Call>(&state.store, state.calls_table(), &CALL_LISTING, &query, &caller).await?;
    Ok(HttpResponse::Ok().json(CallList {
        count: page.items.len(),
        calls: page.items,
        next_token: page.next_token,
    }))
}
