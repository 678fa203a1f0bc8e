//! Call schemas.

use super::{object, query_object, Validator};
use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::object_store;
use crate::timestamps::Bound;
use crm_common::model::call::{CallDirection, CallOutcome};
use crm_common::model::WireEnum;
use crm_common::requests::{CreateCall, UpdateCallNotes};
use serde_json::Value;
use std::collections::HashMap;

pub fn create(body: &Value) -> Result<CreateCall, ApiError> {
    let mut v = Validator::body(object(body)?);
    let lead_id = v.required_uuid("leadId");
    let agent_id = v.required_uuid("agentId");
    let direction = v.required_enum::<CallDirection>("direction");
    let outcome = v.required_enum::<CallOutcome>("outcome");
    let start_time = v.required_timestamp("startTime");
    let end_time = v.required_timestamp("endTime");
    let duration = v.required_number("duration", 0.0);
    let recording_url = v.optional_url("recordingUrl");
    let recording_s3_key = v.optional_string("recordingS3Key", 1, 1024);
    if recording_s3_key
        .as_deref()
        .is_some_and(|key| !object_store::is_valid_key(key))
    {
        v.reject(
            "recordingS3Key",
            "Recording key must be a relative path of non-empty segments",
        );
    }
    let notes = v.optional_string("notes", 0, 2000);
    let tags = v.optional_tags("tags");
    let connect_contact_id = v.optional_string("connectContactId", 0, usize::MAX);
    let queue_name = v.optional_string("queueName", 0, usize::MAX);
    let transferred_from = v.optional_uuid("transferredFrom");
    let transferred_to = v.optional_uuid("transferredTo");

    match (lead_id, agent_id, direction, outcome, start_time, end_time, duration) {
        (
            Some(lead_id),
            Some(agent_id),
            Some(direction),
            Some(outcome),
            Some(start_time),
            Some(end_time),
            Some(duration),
        ) if v.is_clean() => Ok(CreateCall {
            lead_id,
            agent_id,
            direction,
            outcome,
            start_time,
            end_time,
            duration,
            recording_url,
            recording_s3_key,
            notes,
            tags,
            connect_contact_id,
            queue_name,
            transferred_from,
            transferred_to,
        }),
        _ => Err(v.into_error()),
    }
}

pub fn update_notes(body: &Value) -> Result<UpdateCallNotes, ApiError> {
    let mut v = Validator::body(object(body)?);
    let update = UpdateCallNotes {
        notes: v.optional_string("notes", 0, 2000),
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
    let lead_id = v.optional_uuid("leadId");
    let agent_id = v.optional_uuid("agentId");
    let direction = v.optional_enum::<CallDirection>("direction");
    let outcome = v.optional_enum::<CallOutcome>("outcome");
    let from_date = v.optional_date_bound("fromDate", Bound::Lower);
    let to_date = v.optional_date_bound("toDate", Bound::Upper);
    let min_duration = v.optional_number("minDuration", 0.0);
    let max_duration = v.optional_number("maxDuration", 0.0);
    let has_recording = v.optional_bool("hasRecording");

    let query = v
        .page()
        .lead(lead_id)
        .filter("agentId", agent_id)
        .filter("direction", direction.map(|d| d.as_str()))
        .filter("outcome", outcome.map(|o| o.as_str()))
        .filter("fromDate", from_date)
        .filter("toDate", to_date)
        .filter("minDuration", min_duration)
        .filter("maxDuration", max_duration)
        .filter("hasRecording", has_recording);
    v.finish_query(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "leadId": "0b8f6a3e-52c4-4d59-9d0e-0e3c1a7d2b11",
            "agentId": "7d1e4c52-9a0b-4f36-8e21-5c6b7a8d9e0f",
            "direction": "OUTBOUND",
            "outcome": "ANSWERED",
            "startTime": "2024-05-10T09:30:00Z",
            "endTime": "2024-05-10T09:31:35Z",
            "duration": 95,
            "recordingUrl": "https://recordings.example.com/c1.wav"
        })
    }

    #[test]
    fn normalizes_call_times() {
        let call = create(&valid()).unwrap();
        assert_eq!(call.start_time, "2024-05-10T09:30:00.000Z");
        assert_eq!(call.direction, CallDirection::Outbound);
        assert_eq!(call.recording_s3_key, None);
    }

    #[test]
    fn rejects_negative_durations_and_bad_urls() {
        let mut body = valid();
        body["duration"] = json!(-3);
        body["recordingUrl"] = json!("not a url");
        body["transferredTo"] = json!("agent-9");
        let err = create(&body).unwrap_err();
        match err {
            ApiError::Validation { errors, .. } => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["duration", "recordingUrl", "transferredTo"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn recording_keys_must_stay_inside_the_bucket() {
        for key in ["../secret.wav", "calls//c1.wav", "calls/", "C:\\rec\\c1.wav", "/abs.wav"] {
            let mut body = valid();
            body["recordingS3Key"] = json!(key);
            match create(&body) {
                Err(ApiError::Validation { errors, .. }) => {
                    assert_eq!(errors.len(), 1, "{key:?}");
                    assert_eq!(errors[0].field, "recordingS3Key");
                }
                other => panic!("{key:?} accepted: {other:?}"),
            }
        }

        let mut body = valid();
        body["recordingS3Key"] = json!("connect/2024/05/10/c1.wav");
        let call = create(&body).unwrap();
        assert_eq!(call.recording_s3_key.as_deref(), Some("connect/2024/05/10/c1.wav"));
    }

    #[test]
    fn notes_update_is_limited_to_notes_and_tags() {
        let update = update_notes(&json!({ "notes": "Call back Friday", "agentId": "x" })).unwrap();
        assert_eq!(update.notes.as_deref(), Some("Call back Friday"));
        assert!(update_notes(&json!({ "notes": "x".repeat(2001) })).is_err());
    }

    #[test]
    fn query_coerces_durations_and_recording_flag() {
        let params = HashMap::from([
            ("minDuration".to_string(), "60".to_string()),
            ("hasRecording".to_string(), "true".to_string()),
        ]);
        let query = query(&params).unwrap();
        assert_eq!(query.filters["minDuration"], json!(60.0));
        assert_eq!(query.filters["hasRecording"], json!(true));

        let params = HashMap::from([("hasRecording".to_string(), "yes".to_string())]);
        assert!(super::query(&params).is_err());
    }
}
