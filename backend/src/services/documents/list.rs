//! # Document Listing
//!
//! `GET /documents?leadId&documentType&uploadedBy&fromDate&toDate&searchTerm&limit&nextToken`
//!
//! `fromDate`/`toDate` bound `uploadedAt`; `searchTerm` matches file name or
//! description. Callers see public documents and their own uploads, on both the
//! `leadId` path and the scan path.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::listing::{self, Access, Criterion, ListSpec};
use crate::state::AppState;
use crate::validation;
use actix_web::{web, HttpResponse};
use crm_common::model::document::Document;
use crm_common::responses::DocumentList;
use std::collections::HashMap;

pub const DOCUMENT_LISTING: ListSpec = ListSpec {
    criteria: &[
        Criterion::Exact {
            param: "documentType",
            attribute: "documentType",
        },
        Criterion::Exact {
            param: "uploadedBy",
            attribute: "uploadedBy",
        },
        Criterion::Range {
            lower: "fromDate",
            upper: "toDate",
            attribute: "uploadedAt",
        },
        Criterion::Contains {
            param: "searchTerm",
            attributes: &["fileName", "description"],
        },
    ],
    access: Access::OwnerOrPublic {
        owner: "uploadedBy",
        public_flag: "isPublic",
    },
};

pub async fn process(
    state: web::Data<AppState>,
    caller: Caller,
    params: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, ApiError> {
    let query = validation::document::query(&params)?;
    let page = listing::fetch_page::<Document>(
        &state.store,
        state.documents_table(),
        &DOCUMENT_LISTING,
        &query,
        &caller,
    )
    .await?;
    Ok(HttpResponse::Ok().json(DocumentList {
        count: page.items.len(),
        documents: page.items,
        next_token: page.next_token,
    }))
}
