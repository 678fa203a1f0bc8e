//! # Filtered Listing
//!
//! Every `GET /<collection>` endpoint runs through `fetch_page`. An entity describes
//! its list endpoint once, as a `ListSpec`: which query parameters filter on which
//! attribute and how, plus the access rule that limits what a caller may see.
//!
//! ## Execution
//!
//! 1. A `leadId` parameter takes the index path: one query on `LeadIdIndex`. The
//!    other filters are not applied on this path, the access rule still is.
//! 2. Otherwise every supplied filter becomes a predicate, the access rule is
//!    ANDed on, and the table is scanned with the result.
//! 3. The store's last evaluated key, if any, is handed back as `nextToken`.
//!
//! Filters run after the page limit (see `storage`), so a page can be short or even
//! empty while `nextToken` is still present. Clients keep paging until it is absent.

use crate::error::ApiError;
use crate::identity::Caller;
use crate::pagination;
use crate::storage::{KeyCondition, Predicate, StartKey, Store, LEAD_ID_INDEX};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// How one query parameter (or a pair of them) narrows the listing.
#[derive(Debug, Clone, Copy)]
pub enum Criterion {
    /// `attribute = value`.
    Exact {
        param: &'static str,
        attribute: &'static str,
    },
    /// Inclusive range over `attribute`; either end may be omitted.
    Range {
        lower: &'static str,
        upper: &'static str,
        attribute: &'static str,
    },
    /// Free-text term matched as a substring of any of `attributes`.
    Contains {
        param: &'static str,
        attributes: &'static [&'static str],
    },
    /// `true` keeps records that have `attribute`, `false` those that don't.
    Presence {
        param: &'static str,
        attribute: &'static str,
    },
}

/// Which records of a collection a caller may list.
#[derive(Debug, Clone, Copy)]
pub enum Access {
    Unrestricted,
    /// Only records whose `attribute` is the caller.
    Owner { attribute: &'static str },
    /// Records flagged public, and the caller's own.
    OwnerOrPublic {
        owner: &'static str,
        public_flag: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub criteria: &'static [Criterion],
    pub access: Access,
}

/// A validated list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Set when the caller asked for one lead's records.
    pub lead_id: Option<String>,
    /// Filter values keyed by query parameter name.
    pub filters: BTreeMap<&'static str, Value>,
    pub limit: u32,
    pub next_token: Option<String>,
}

impl ListQuery {
    pub fn new(limit: u32, next_token: Option<String>) -> Self {
        Self {
            lead_id: None,
            filters: BTreeMap::new(),
            limit,
            next_token,
        }
    }

    pub fn lead(mut self, lead_id: Option<String>) -> Self {
        self.lead_id = lead_id;
        self
    }

    pub fn filter<V: Into<Value>>(mut self, param: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.filters.insert(param, value.into());
        }
        self
    }
}

#[derive(Debug)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Predicates for the supplied filters, in declaration order.
pub fn filter_predicates(criteria: &[Criterion], filters: &BTreeMap<&'static str, Value>) -> Vec<Predicate> {
    let mut parts = Vec::new();
    for criterion in criteria {
        match *criterion {
            Criterion::Exact { param, attribute } => {
                if let Some(value) = filters.get(param) {
                    parts.push(Predicate::Eq(attribute.to_string(), value.clone()));
                }
            }
            Criterion::Range {
                lower,
                upper,
                attribute,
            } => match (filters.get(lower), filters.get(upper)) {
                (Some(low), Some(high)) => parts.push(Predicate::Between(
                    attribute.to_string(),
                    low.clone(),
                    high.clone(),
                )),
                (Some(low), None) => parts.push(Predicate::Gte(attribute.to_string(), low.clone())),
                (None, Some(high)) => parts.push(Predicate::Lte(attribute.to_string(), high.clone())),
                (None, None) => {}
            },
            Criterion::Contains { param, attributes } => {
                if let Some(term) = filters.get(param) {
                    let mut alternatives: Vec<Predicate> = attributes
                        .iter()
                        .map(|attribute| Predicate::Contains(attribute.to_string(), term.clone()))
                        .collect();
                    match alternatives.len() {
                        0 => {}
                        1 => parts.append(&mut alternatives),
                        _ => parts.push(Predicate::Or(alternatives)),
                    }
                }
            }
            Criterion::Presence { param, attribute } => match filters.get(param) {
                Some(Value::Bool(true)) => parts.push(Predicate::Exists(attribute.to_string())),
                Some(Value::Bool(false)) => parts.push(Predicate::NotExists(attribute.to_string())),
                _ => {}
            },
        }
    }
    parts
}

pub fn access_predicate(access: Access, caller: &Caller) -> Option<Predicate> {
    match access {
        Access::Unrestricted => None,
        Access::Owner { attribute } => Some(Predicate::eq(attribute, caller.subject())),
        Access::OwnerOrPublic { owner, public_flag } => Some(Predicate::Or(vec![
            Predicate::eq(public_flag, true),
            Predicate::eq(owner, caller.subject()),
        ])),
    }
}

/// Reads one page of `table` for `caller`.
pub async fn fetch_page<T: DeserializeOwned>(
    store: &Store,
    table: &str,
    spec: &ListSpec,
    query: &ListQuery,
    caller: &Caller,
) -> Result<ListPage<T>, ApiError> {
    let start_key = query
        .next_token
        .as_deref()
        .map(pagination::decode::<StartKey>)
        .transpose()?;
    let access = access_predicate(spec.access, caller);

    let page = match &query.lead_id {
        Some(lead_id) => {
            debug!(
                "Querying {} on {} for leadId {} (filter: {})",
                table,
                LEAD_ID_INDEX,
                lead_id,
                access.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
            );
            let key = KeyCondition {
                attribute: "leadId",
                value: lead_id,
            };
            store
                .query_items(
                    table,
                    Some(LEAD_ID_INDEX),
                    key,
                    access.as_ref(),
                    query.limit,
                    start_key.as_ref(),
                )
                .await?
        }
        None => {
            let mut parts = filter_predicates(spec.criteria, &query.filters);
            parts.extend(access);
            let filter = Predicate::all(parts);
            debug!(
                "Scanning {} (filter: {})",
                table,
                filter.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
            );
            store
                .scan_items(table, filter.as_ref(), query.limit, start_key.as_ref())
                .await?
        }
    };

    let next_token = page
        .last_evaluated_key
        .as_ref()
        .map(pagination::encode)
        .transpose()?;
    Ok(ListPage {
        items: page.items,
        next_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOTES: &str = "notes";

    const CRITERIA: &[Criterion] = &[
        Criterion::Exact {
            param: "kind",
            attribute: "kind",
        },
        Criterion::Range {
            lower: "fromDate",
            upper: "toDate",
            attribute: "createdAt",
        },
        Criterion::Contains {
            param: "searchTerm",
            attributes: &["title", "body"],
        },
        Criterion::Presence {
            param: "hasAttachment",
            attribute: "attachmentKey",
        },
    ];

    const SPEC: ListSpec = ListSpec {
        criteria: CRITERIA,
        access: Access::OwnerOrPublic {
            owner: "author",
            public_flag: "shared",
        },
    };

    fn query() -> ListQuery {
        ListQuery::new(20, None)
    }

    #[test]
    fn no_filters_means_no_predicates() {
        assert!(filter_predicates(CRITERIA, &query().filters).is_empty());
    }

    #[test]
    fn range_degrades_to_one_sided_bounds() {
        let q = query().filter("fromDate", Some("2023-01-01T00:00:00.000Z"));
        assert_eq!(
            filter_predicates(CRITERIA, &q.filters),
            vec![Predicate::Gte("createdAt".into(), json!("2023-01-01T00:00:00.000Z"))]
        );

        let q = query().filter("toDate", Some("2023-01-31T23:59:59.999Z"));
        assert_eq!(
            filter_predicates(CRITERIA, &q.filters),
            vec![Predicate::Lte("createdAt".into(), json!("2023-01-31T23:59:59.999Z"))]
        );
    }

    #[test]
    fn builds_every_kind_of_predicate() {
        let q = query()
            .filter("kind", Some("memo"))
            .filter("fromDate", Some("a"))
            .filter("toDate", Some("b"))
            .filter("searchTerm", Some("claim"))
            .filter("hasAttachment", Some(false));
        let rendered = Predicate::all(filter_predicates(CRITERIA, &q.filters))
            .unwrap()
            .to_string();
        assert_eq!(
            rendered,
            r#"(kind = "memo" AND createdAt BETWEEN "a" AND "b" AND (contains(title, "claim") OR contains(body, "claim")) AND attribute_not_exists(attachmentKey))"#
        );
    }

    #[test]
    fn access_rules() {
        let caller = Caller::new("U1");
        assert_eq!(access_predicate(Access::Unrestricted, &caller), None);
        assert_eq!(
            access_predicate(Access::Owner { attribute: "agentId" }, &caller),
            Some(Predicate::eq("agentId", "U1"))
        );
        assert_eq!(
            access_predicate(SPEC.access, &caller).unwrap().to_string(),
            r#"(shared = true OR author = "U1")"#
        );
    }

    async fn seeded() -> Store {
        let store = Store::open_in_memory(&[NOTES]).unwrap();
        for (id, author, shared, lead) in [
            ("n1", "U1", false, "L1"),
            ("n2", "U2", false, "L1"),
            ("n3", "U2", true, "L1"),
            ("n4", "U1", false, "L2"),
            ("n5", "U2", false, "L2"),
        ] {
            store
                .put_item(
                    NOTES,
                    json!({ "id": id, "author": author, "shared": shared, "leadId": lead, "kind": "memo" }),
                )
                .await
                .unwrap();
        }
        store
    }

    fn ids(page: &ListPage<Value>) -> Vec<&str> {
        page.items.iter().map(|v| v["id"].as_str().unwrap()).collect()
    }

    #[actix_web::test]
    async fn access_rule_applies_to_scans_and_lead_queries() {
        let store = seeded().await;
        let caller = Caller::new("U1");

        let page: ListPage<Value> = fetch_page(&store, NOTES, &SPEC, &query(), &caller).await.unwrap();
        assert_eq!(ids(&page), vec!["n1", "n3", "n4"]);
        assert_eq!(page.next_token, None);

        let by_lead = query().lead(Some("L1".to_string())).filter("kind", Some("other"));
        let page: ListPage<Value> = fetch_page(&store, NOTES, &SPEC, &by_lead, &caller).await.unwrap();
        assert_eq!(ids(&page), vec!["n1", "n3"]);
    }

    #[actix_web::test]
    async fn tokens_resume_where_the_previous_page_stopped() {
        let store = seeded().await;
        let caller = Caller::new("U2");
        let mut q = ListQuery::new(2, None);
        let mut seen = Vec::new();
        loop {
            let page: ListPage<Value> = fetch_page(&store, NOTES, &SPEC, &q, &caller).await.unwrap();
            assert!(page.items.len() <= 2);
            seen.extend(ids(&page).into_iter().map(str::to_string));
            match page.next_token {
                Some(token) => q.next_token = Some(token),
                None => break,
            }
        }
        assert_eq!(seen, vec!["n2", "n3", "n5"]);
    }

    #[actix_web::test]
    async fn garbage_tokens_are_rejected() {
        let store = seeded().await;
        let q = ListQuery::new(2, Some("%%%".to_string()));
        let result = fetch_page::<Value>(&store, NOTES, &SPEC, &q, &Caller::new("U1")).await;
        assert!(matches!(result, Err(ApiError::InvalidPaginationToken)));
    }
}
