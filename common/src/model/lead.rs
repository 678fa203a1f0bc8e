use serde::{Deserialize, Serialize};

wire_enum! {
    /// Position of a lead in the sales pipeline.
    LeadStatus {
        New => "NEW",
        Contacted => "CONTACTED",
        Qualified => "QUALIFIED",
        Proposal => "PROPOSAL",
        Negotiation => "NEGOTIATION",
        Won => "WON",
        Lost => "LOST",
    }
}

wire_enum! {
    /// Channel through which a lead was acquired.
    LeadSource {
        Website => "WEBSITE",
        Referral => "REFERRAL",
        ColdCall => "COLD_CALL",
        SocialMedia => "SOCIAL_MEDIA",
        EmailCampaign => "EMAIL_CAMPAIGN",
        Event => "EVENT",
        Other => "OTHER",
    }
}

/// A prospective client, stored one record per `id` in the leads table.
///
/// `id` and `created_at` are assigned by the server on creation and never change.
/// `updated_at` is rewritten by the storage layer on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub status: LeadStatus,
    pub source: LeadSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Identifier of the agent the lead is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contacted_at: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::model::whole_number::serialize_option"
    )]
    pub estimated_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
