use serde::{Deserialize, Serialize};

wire_enum! {
    /// Business classification of an uploaded file.
    DocumentType {
        Contract => "CONTRACT",
        Proposal => "PROPOSAL",
        Invoice => "INVOICE",
        ClaimForm => "CLAIM_FORM",
        Identification => "IDENTIFICATION",
        InsurancePolicy => "INSURANCE_POLICY",
        MedicalRecord => "MEDICAL_RECORD",
        Other => "OTHER",
    }
}

/// Metadata for a file held in the documents bucket.
///
/// The file itself lives in the object store under `s3_key`
/// (`{leadId}/{documentId}/{fileName}`); this record only describes it.
/// `lead_id` is an advisory reference: nothing checks that the lead exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub lead_id: String,
    pub file_name: String,
    /// MIME type declared by the uploader.
    pub file_type: String,
    /// Size in bytes declared by the uploader.
    #[serde(serialize_with = "crate::model::whole_number::serialize")]
    pub file_size: f64,
    pub document_type: DocumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub s3_key: String,
    /// Subject of the caller that requested the upload URL. Owner of the record.
    pub uploaded_by: String,
    pub uploaded_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Public documents are visible to every caller, private ones only to `uploaded_by`.
    #[serde(default)]
    pub is_public: bool,
}
