//! Document schemas.
//!
//! Documents are created through `upload-url`; only the descriptive fields can be
//! changed afterwards. File identity (name, type, size, object key) is fixed.

use super::{object, query_object, Validator};
use crate::error::ApiError;
use crate::listing::ListQuery;
use crate::timestamps::Bound;
use crm_common::model::document::DocumentType;
use crm_common::model::WireEnum;
use crm_common::requests::{UpdateDocument, UploadUrlRequest};
use serde_json::Value;
use std::collections::HashMap;

pub fn upload_url(body: &Value) -> Result<UploadUrlRequest, ApiError> {
    let mut v = Validator::body(object(body)?);
    let lead_id = v.required_uuid("leadId");
    let file_name = v.required_string("fileName", 1, 255);
    if file_name
        .as_deref()
        .is_some_and(|name| name.contains(['/', '\\']) || name == "." || name == "..")
    {
        v.reject("fileName", "File name must not contain path separators");
    }
    let file_type = v.required_string("fileType", 1, 50);
    let file_size = v.required_number("fileSize", 0.0);
    let document_type = v.required_enum::<DocumentType>("documentType");
    let description = v.optional_string("description", 0, 1000);
    let tags = v.optional_tags("tags");
    let is_public = v.optional_bool("isPublic").unwrap_or(false);

    match (lead_id, file_name, file_type, file_size, document_type) {
        (Some(lead_id), Some(file_name), Some(file_type), Some(file_size), Some(document_type))
            if v.is_clean() =>
        {
            Ok(UploadUrlRequest {
                lead_id,
                file_name,
                file_type,
                file_size,
                document_type,
                description,
                tags,
                is_public,
            })
        }
        _ => Err(v.into_error()),
    }
}

pub fn update(body: &Value) -> Result<UpdateDocument, ApiError> {
    let mut v = Validator::body(object(body)?);
    let update = UpdateDocument {
        document_type: v.optional_enum("documentType"),
        description: v.optional_string("description", 0, 1000),
        tags: v.optional_tags("tags"),
        is_public: v.optional_bool("isPublic"),
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
    let document_type = v.optional_enum::<DocumentType>("documentType");
    let uploaded_by = v.optional_string("uploadedBy", 1, 200);
    let from_date = v.optional_date_bound("fromDate", Bound::Lower);
    let to_date = v.optional_date_bound("toDate", Bound::Upper);
    let search_term = v.optional_string("searchTerm", 1, 200);

    let query = v
        .page()
        .lead(lead_id)
        .filter("documentType", document_type.map(|t| t.as_str()))
        .filter("uploadedBy", uploaded_by)
        .filter("fromDate", from_date)
        .filter("toDate", to_date)
        .filter("searchTerm", search_term);
    v.finish_query(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEAD: &str = "0b8f6a3e-52c4-4d59-9d0e-0e3c1a7d2b11";

    #[test]
    fn is_public_defaults_to_false() {
        let request = upload_url(&json!({
            "leadId": LEAD,
            "fileName": "policy.pdf",
            "fileType": "application/pdf",
            "fileSize": 2048,
            "documentType": "INSURANCE_POLICY"
        }))
        .unwrap();
        assert!(!request.is_public);
        assert_eq!(request.file_size, 2048.0);
        assert_eq!(request.document_type, DocumentType::InsurancePolicy);
    }

    #[test]
    fn file_names_cannot_name_other_objects() {
        for name in ["../x.pdf", "a/b.pdf", "a\\b.pdf", ".."] {
            let err = upload_url(&json!({
                "leadId": LEAD,
                "fileName": name,
                "fileType": "application/pdf",
                "fileSize": 1,
                "documentType": "OTHER"
            }))
            .unwrap_err();
            assert!(matches!(err, ApiError::Validation { .. }), "{name}");
        }
    }

    #[test]
    fn update_ignores_immutable_fields() {
        let update = update(&json!({ "fileName": "renamed.pdf", "s3Key": "x", "isPublic": true })).unwrap();
        assert_eq!(
            update,
            UpdateDocument {
                is_public: Some(true),
                ..UpdateDocument::default()
            }
        );
    }

    #[test]
    fn lead_id_selects_the_index_path() {
        let params = HashMap::from([
            ("leadId".to_string(), LEAD.to_string()),
            ("searchTerm".to_string(), "claim".to_string()),
        ]);
        let query = query(&params).unwrap();
        assert_eq!(query.lead_id.as_deref(), Some(LEAD));
        assert_eq!(query.filters["searchTerm"], json!("claim"));

        let params = HashMap::from([("leadId".to_string(), "L1".to_string())]);
        assert!(super::query(&params).is_err());
    }
}
