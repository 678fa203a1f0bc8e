//! # Input Validation
//!
//! Request bodies and query strings arrive as untyped JSON. Each entity module
//! (`lead`, `document`, `call`) declares its create, update and query schemas as a
//! sequence of `Validator` calls, and gets back either the typed payload or every
//! violated constraint at once.
//!
//! A `Validator` records a `FieldViolation` for each failed check and keeps going;
//! the schema function decides at the end whether the input was clean. Fields the
//! schema does not mention are ignored.
//!
//! Query strings carry only strings, so a query-mode validator coerces numbers and
//! booleans from their text before checking them.

pub mod call;
pub mod document;
pub mod lead;

use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::timestamps::{self, Bound};
use crm_common::model::WireEnum;
use crm_common::responses::FieldViolation;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Body,
    Query,
}

pub struct Validator<'a> {
    input: &'a Map<String, Value>,
    mode: Mode,
    errors: Vec<FieldViolation>,
}

impl<'a> Validator<'a> {
    pub fn body(input: &'a Map<String, Value>) -> Self {
        Self {
            input,
            mode: Mode::Body,
            errors: Vec::new(),
        }
    }

    pub fn query(input: &'a Map<String, Value>) -> Self {
        Self {
            input,
            mode: Mode::Query,
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The error for the violations collected so far.
    pub fn into_error(self) -> ApiError {
        match self.mode {
            Mode::Body => ApiError::invalid_input(self.errors),
            Mode::Query => ApiError::invalid_query(self.errors),
        }
    }

    /// Adds a violation that no single field check covers.
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldViolation::new(field, message));
    }

    /// The raw value of `field`, treating an absent field as `None`.
    ///
    /// In query mode an empty string also counts as absent (`?status=`).
    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.input.get(field) {
            Some(Value::String(s)) if self.mode == Mode::Query && s.is_empty() => None,
            other => other,
        }
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        let value = self.present(field);
        if value.is_none() {
            self.reject(field, "Required");
        }
        value
    }

    fn as_str(&mut self, field: &str, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::String(s) => Some(s.as_str()),
            other => {
                self.reject(field, format!("Expected string, received {}", kind_of(other)));
                None
            }
        }
    }

    fn check_length(&mut self, field: &str, value: &str, min: usize, max: usize) -> bool {
        let len = value.chars().count();
        if len < min {
            self.reject(field, format!("String must contain at least {min} character(s)"));
            false
        } else if len > max {
            self.reject(field, format!("String must contain at most {max} character(s)"));
            false
        } else {
            true
        }
    }

    fn string(&mut self, field: &str, value: &'a Value, min: usize, max: usize) -> Option<String> {
        let s = self.as_str(field, value)?;
        self.check_length(field, s, min, max).then(|| s.to_string())
    }

    pub fn required_string(&mut self, field: &str, min: usize, max: usize) -> Option<String> {
        let value = self.required(field)?;
        self.string(field, value, min, max)
    }

    pub fn optional_string(&mut self, field: &str, min: usize, max: usize) -> Option<String> {
        let value = self.present(field)?;
        self.string(field, value, min, max)
    }

    fn enumeration<E: WireEnum>(&mut self, field: &str, value: &'a Value) -> Option<E> {
        let s = self.as_str(field, value)?;
        let parsed = E::parse(s);
        if parsed.is_none() {
            let expected = E::VARIANTS
                .iter()
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            self.reject(
                field,
                format!("Invalid enum value. Expected {expected}, received '{s}'"),
            );
        }
        parsed
    }

    pub fn required_enum<E: WireEnum>(&mut self, field: &str) -> Option<E> {
        let value = self.required(field)?;
        self.enumeration(field, value)
    }

    pub fn optional_enum<E: WireEnum>(&mut self, field: &str) -> Option<E> {
        let value = self.present(field)?;
        self.enumeration(field, value)
    }

    fn uuid(&mut self, field: &str, value: &'a Value) -> Option<String> {
        let s = self.as_str(field, value)?;
        if s.len() == 36 && uuid::Uuid::parse_str(s).is_ok() {
            Some(s.to_string())
        } else {
            self.reject(field, "Invalid uuid");
            None
        }
    }

    pub fn required_uuid(&mut self, field: &str) -> Option<String> {
        let value = self.required(field)?;
        self.uuid(field, value)
    }

    pub fn optional_uuid(&mut self, field: &str) -> Option<String> {
        let value = self.present(field)?;
        self.uuid(field, value)
    }

    /// Accepts any RFC 3339 timestamp and returns it in the canonical stored form.
    fn timestamp(&mut self, field: &str, value: &'a Value) -> Option<String> {
        let s = self.as_str(field, value)?;
        let normalized = timestamps::normalize(s);
        if normalized.is_none() {
            self.reject(field, "Invalid datetime");
        }
        normalized
    }

    pub fn required_timestamp(&mut self, field: &str) -> Option<String> {
        let value = self.required(field)?;
        self.timestamp(field, value)
    }

    pub fn optional_timestamp(&mut self, field: &str) -> Option<String> {
        let value = self.present(field)?;
        self.timestamp(field, value)
    }

    /// A range bound given as a timestamp or as a `YYYY-MM-DD` date.
    pub fn optional_date_bound(&mut self, field: &str, bound: Bound) -> Option<String> {
        let value = self.present(field)?;
        let s = self.as_str(field, value)?;
        let parsed = timestamps::parse_bound(s, bound);
        if parsed.is_none() {
            self.reject(field, "Invalid datetime");
        }
        parsed
    }

    pub fn required_email(&mut self, field: &str) -> Option<String> {
        let value = self.required(field)?;
        self.email(field, value)
    }

    pub fn optional_email(&mut self, field: &str) -> Option<String> {
        let value = self.present(field)?;
        self.email(field, value)
    }

    fn email(&mut self, field: &str, value: &'a Value) -> Option<String> {
        let s = self.as_str(field, value)?;
        if email_pattern().is_some_and(|pattern| pattern.is_match(s)) {
            Some(s.to_string())
        } else {
            self.reject(field, "Invalid email");
            None
        }
    }

    pub fn optional_url(&mut self, field: &str) -> Option<String> {
        let value = self.present(field)?;
        let s = self.as_str(field, value)?;
        match url::Url::parse(s) {
            Ok(_) => Some(s.to_string()),
            Err(_) => {
                self.reject(field, "Invalid url");
                None
            }
        }
    }

    fn number(&mut self, field: &str, value: &'a Value, min: f64) -> Option<f64> {
        let number = match (value, self.mode) {
            (Value::Number(n), _) => n.as_f64(),
            (Value::String(s), Mode::Query) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => {
                    self.reject(field, "Expected number, received nan");
                    return None;
                }
            },
            (other, _) => {
                self.reject(field, format!("Expected number, received {}", kind_of(other)));
                return None;
            }
        }?;
        if number < min {
            self.reject(field, format!("Number must be greater than or equal to {min}"));
            return None;
        }
        Some(number)
    }

    pub fn required_number(&mut self, field: &str, min: f64) -> Option<f64> {
        let value = self.required(field)?;
        self.number(field, value, min)
    }

    pub fn optional_number(&mut self, field: &str, min: f64) -> Option<f64> {
        let value = self.present(field)?;
        self.number(field, value, min)
    }

    pub fn optional_bool(&mut self, field: &str) -> Option<bool> {
        let value = self.present(field)?;
        match (value, self.mode) {
            (Value::Bool(b), _) => Some(*b),
            (Value::String(s), Mode::Query) if s == "true" => Some(true),
            (Value::String(s), Mode::Query) if s == "false" => Some(false),
            (other, _) => {
                self.reject(field, format!("Expected boolean, received {}", kind_of(other)));
                None
            }
        }
    }

    /// A list of strings. Element violations are reported as `tags.<index>`.
    pub fn optional_tags(&mut self, field: &str) -> Option<Vec<String>> {
        let value = self.present(field)?;
        let Value::Array(elements) = value else {
            self.reject(field, format!("Expected array, received {}", kind_of(value)));
            return None;
        };
        let mut tags = Vec::with_capacity(elements.len());
        let mut valid = true;
        for (i, element) in elements.iter().enumerate() {
            match element {
                Value::String(tag) => tags.push(tag.clone()),
                other => {
                    self.reject(
                        &format!("{field}.{i}"),
                        format!("Expected string, received {}", kind_of(other)),
                    );
                    valid = false;
                }
            }
        }
        valid.then_some(tags)
    }

    /// Page size: defaults to 20, must be an integer in `[1, 100]`.
    fn limit(&mut self) -> u32 {
        let Some(value) = self.present("limit") else {
            return DEFAULT_LIMIT;
        };
        let Some(limit) = self.number("limit", value, 1.0) else {
            return DEFAULT_LIMIT;
        };
        if limit > f64::from(MAX_LIMIT) {
            self.reject("limit", format!("Number must be less than or equal to {MAX_LIMIT}"));
            DEFAULT_LIMIT
        } else if limit.fract() != 0.0 {
            self.reject("limit", "Expected integer, received float");
            DEFAULT_LIMIT
        } else {
            limit as u32
        }
    }

    /// Reads the paging parameters shared by every list endpoint.
    pub fn page(&mut self) -> ListQuery {
        let limit = self.limit();
        let next_token = self.optional_string("nextToken", 1, usize::MAX);
        ListQuery::new(limit, next_token)
    }

    pub fn finish_query(self, query: ListQuery) -> Result<ListQuery, ApiError> {
        if self.is_clean() {
            Ok(query)
        } else {
            Err(self.into_error())
        }
    }
}

/// The body as a JSON object, or a validation error naming what was sent instead.
pub fn object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
    body.as_object().ok_or_else(|| {
        ApiError::invalid_input(vec![FieldViolation::new(
            "body",
            format!("Expected object, received {}", kind_of(body)),
        )])
    })
}

/// Lifts a parsed query string into the object shape validators read.
pub fn query_object(params: &HashMap<String, String>) -> Map<String, Value> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$").ok()
        })
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_common::model::lead::LeadStatus;
    use serde_json::json;

    fn messages(v: &Validator) -> Vec<(String, String)> {
        v.errors
            .iter()
            .map(|e| (e.field.clone(), e.message.clone()))
            .collect()
    }

    #[test]
    fn collects_every_violation() {
        let input = json!({ "firstName": "", "email": "nope", "status": "OPEN" });
        let input = input.as_object().unwrap();
        let mut v = Validator::body(input);
        v.required_string("firstName", 1, 100);
        v.required_string("lastName", 1, 100);
        v.required_email("email");
        v.required_enum::<LeadStatus>("status");

        assert_eq!(
            messages(&v),
            vec![
                ("firstName".into(), "String must contain at least 1 character(s)".into()),
                ("lastName".into(), "Required".into()),
                ("email".into(), "Invalid email".into()),
                (
                    "status".into(),
                    "Invalid enum value. Expected 'NEW' | 'CONTACTED' | 'QUALIFIED' | 'PROPOSAL' | 'NEGOTIATION' | 'WON' | 'LOST', received 'OPEN'".into()
                ),
            ]
        );
    }

    #[test]
    fn body_mode_does_not_coerce() {
        let input = json!({ "fileSize": "12", "isPublic": "true", "tags": ["a", 1] });
        let input = input.as_object().unwrap();
        let mut v = Validator::body(input);
        assert_eq!(v.required_number("fileSize", 0.0), None);
        assert_eq!(v.optional_bool("isPublic"), None);
        assert_eq!(v.optional_tags("tags"), None);
        assert_eq!(
            messages(&v),
            vec![
                ("fileSize".into(), "Expected number, received string".into()),
                ("isPublic".into(), "Expected boolean, received string".into()),
                ("tags.1".into(), "Expected string, received number".into()),
            ]
        );
    }

    #[test]
    fn query_mode_coerces_numbers_and_booleans() {
        let params = HashMap::from([
            ("minDuration".to_string(), "30".to_string()),
            ("hasRecording".to_string(), "false".to_string()),
            ("status".to_string(), String::new()),
        ]);
        let input = query_object(&params);
        let mut v = Validator::query(&input);
        assert_eq!(v.optional_number("minDuration", 0.0), Some(30.0));
        assert_eq!(v.optional_bool("hasRecording"), Some(false));
        assert_eq!(v.optional_enum::<LeadStatus>("status"), None);
        assert!(v.is_clean());
    }

    #[test]
    fn limit_defaults_and_bounds() {
        for (raw, expected) in [(None, Some(20)), (Some("1"), Some(1)), (Some("100"), Some(100))] {
            let mut params = HashMap::new();
            if let Some(raw) = raw {
                params.insert("limit".to_string(), raw.to_string());
            }
            let input = query_object(&params);
            let mut v = Validator::query(&input);
            let query = v.page();
            assert_eq!(v.finish_query(query).ok().map(|q| q.limit), expected);
        }

        for raw in ["0", "101", "2.5", "ten"] {
            let params = HashMap::from([("limit".to_string(), raw.to_string())]);
            let input = query_object(&params);
            let mut v = Validator::query(&input);
            let query = v.page();
            assert!(v.finish_query(query).is_err(), "limit={raw} must be rejected");
        }
    }

    #[test]
    fn timestamps_are_normalized() {
        let input = json!({ "startTime": "2024-05-10T11:30:00+02:00", "endTime": "soon" });
        let input = input.as_object().unwrap();
        let mut v = Validator::body(input);
        assert_eq!(
            v.required_timestamp("startTime").as_deref(),
            Some("2024-05-10T09:30:00.000Z")
        );
        assert_eq!(v.required_timestamp("endTime"), None);
        assert_eq!(messages(&v), vec![("endTime".into(), "Invalid datetime".into())]);
    }

    #[test]
    fn uuids_must_be_hyphenated() {
        let input = json!({
            "a": "6f1c2b8e-2d1f-4e7a-9a43-0b9c1d2e3f40",
            "b": "6f1c2b8e2d1f4e7a9a430b9c1d2e3f40",
        });
        let input = input.as_object().unwrap();
        let mut v = Validator::body(input);
        assert!(v.required_uuid("a").is_some());
        assert!(v.required_uuid("b").is_none());
    }

    #[test]
    fn emails() {
        for (email, ok) in [
            ("ann@example.com", true),
            ("ann.o'neil+claims@sub.example.co.uk", true),
            ("ann@example", false),
            ("@example.com", false),
            ("ann example@example.com", false),
        ] {
            assert_eq!(email_pattern().unwrap().is_match(email), ok, "{email}");
        }
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        let err = object(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref errors, .. }
            if errors[0].message == "Expected object, received array"));
    }
}
