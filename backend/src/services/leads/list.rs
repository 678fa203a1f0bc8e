//! # Lead Listing
//!
//! `GET /leads?status&source&assignedTo&fromDate&toDate&searchTerm&limit&nextToken`
//!
//! `fromDate`/`toDate` bound `createdAt`; `searchTerm` is a case-sensitive substring
//! match on first name, last name, email or company. Every lead is visible to every
//! authenticated caller.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::listing::{self, Access, Criterion, ListSpec};
use crate::state::AppState;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::lead::Lead;
use crm_common::responses::LeadList;
use std::collections::HashMap;

pub const LEAD_LISTING: ListSpec = ListSpec {
    criteria: &[
        Criterion::Exact {
            param: "status",
            attribute: "status",
        },
        Criterion::Exact {
            param: "source",
            attribute: "source",
        },
        Criterion::Exact {
            param: "assignedTo",
            attribute: "assignedTo",
        },
        Criterion::Range {
            lower: "fromDate",
            upper: "toDate",
            attribute: "createdAt",
        },
        Criterion::Contains {
            param: "searchTerm",
            attributes: &["firstName", "lastName", "email", "company"],
        },
    ],
    access: Access::Unrestricted,
};

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ApiError> {
    let query = validation::lead::query(&params)?;
    let page = listing::fetch_page::<Lead>(&state.store, state.leads_table(), &LEAD_LISTING, &query, &caller).await?;
    Ok(HttpResponse::Ok().json(LeadList {
        count: page.items.len(),
        leads: page.items,
        next_token: page.next_token,
    }))
}
