use serde::{Deserialize, Serialize};

wire_enum! {
    CallDirection {
        Inbound => "INBOUND",
        Outbound => "OUTBOUND",
    }
}

wire_enum! {
    CallOutcome {
        Answered => "ANSWERED",
        Voicemail => "VOICEMAIL",
        NoAnswer => "NO_ANSWER",
        Busy => "BUSY",
        Failed => "FAILED",
    }
}

/// A phone call between an agent and a lead.
///
/// Owned by `agent_id`: only that agent may read, annotate or fetch the recording of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub lead_id: String,
    pub agent_id: String,
    pub direction: CallDirection,
    pub outcome: CallOutcome,
    pub start_time: String,
    pub end_time: String,
    /// Length of the call in seconds.
    #[serde(serialize_with = "crate::model::whole_number::serialize")]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
    /// Key of the recording in the recordings bucket, when one was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_s3_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Contact identifier assigned by the telephony platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferred_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferred_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
