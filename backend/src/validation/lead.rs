//! Lead schemas.

use super::{object, query_object, Validator};
use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::timestamps::Bound;
use crm_common::model::lead::{LeadSource, LeadStatus};
use crm_common::model::WireEnum;
use crm_common::requests::{CreateLead, UpdateLead};
use serde_json::Value;
use std::collections::HashMap;

pub fn create(body: &Value) -> Result<CreateLead, ApiError> {
    let mut v = Validator::body(object(body)?);
    let first_name = v.required_string("firstName", 1, 100);
    let last_name = v.required_string("lastName", 1, 100);
    let email = v.required_email("email");
    let phone = v.optional_string("phone", 10, 20);
    let company = v.optional_string("company", 1, 100);
    let status = v.required_enum::<LeadStatus>("status");
    let source = v.required_enum::<LeadSource>("source");
    let notes = v.optional_string("notes", 0, 2000);
    let assigned_to = v.optional_uuid("assignedTo");
    let last_contacted_at = v.optional_timestamp("lastContactedAt");
    let estimated_value = v.optional_number("estimatedValue", 0.0);
    let tags = v.optional_tags("tags");

    match (first_name, last_name, email, status, source) {
        (Some(first_name), Some(last_name), Some(email), Some(status), Some(source)) if v.is_clean() => {
            Ok(CreateLead {
                first_name,
                last_name,
                email,
                phone,
                company,
                status,
                source,
                notes,
                assigned_to,
                last_contacted_at,
                estimated_value,
                tags,
            })
        }
        _ => Err(v.into_error()),
    }
}

/// Every create field, all optional.
pub fn update(body: &Value) -> Result<UpdateLead, ApiError> {
    let mut v = Validator::body(object(body)?);
    let update = UpdateLead {
        first_name: v.optional_string("firstName", 1, 100),
        last_name: v.optional_string("lastName", 1, 100),
        email: v.optional_email("email"),
        phone: v.optional_string("phone", 10, 20),
        company: v.optional_string("company", 1, 100),
        status: v.optional_enum("status"),
        source: v.optional_enum("source"),
        notes: v.optional_string("notes", 0, 2000),
        assigned_to: v.optional_uuid("assignedTo"),
        last_contacted_at: v.optional_timestamp("lastContactedAt"),
        estimated_value: v.optional_number("estimatedValue", 0.0),
        tags: v.optional_tags("tags"),
    };
    if v.is_clean() {
        Ok(update)
    } else {
        Err(v.into_error())
    }
}

pub fn query(params: &HashMap<String, String>) -> Result<ListQuery, ApiError> {
    let input = query_object(params);
    let mut v = Validator::query(&input);
    let status = v.optional_enum::<LeadStatus>("status");
    let source = v.optional_enum::<LeadSource>("source");
    let assigned_to = v.optional_uuid("assignedTo");
    let from_date = v.optional_date_bound("fromDate", Bound::Lower);
    let to_date = v.optional_date_bound("toDate", Bound::Upper);
    let search_term = v.optional_string("searchTerm", 1, 200);

    let query = v
        .page()
        .filter("status", status.map(|s| s.as_str()))
        .filter("source", source.map(|s| s.as_str()))
        .filter("assignedTo", assigned_to)
        .filter("fromDate", from_date)
        .filter("toDate", to_date)
        .filter("searchTerm", search_term);
    v.finish_query(query)
}
