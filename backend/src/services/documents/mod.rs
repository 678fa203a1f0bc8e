//! # Document Service Module
//!
//! Routes under `/documents`. These keep the metadata records only: the client
//! uploads and downloads document bodies against object storage with the pre-signed
//! URLs issued here (by default the `/objects` routes of this same service).
//!
//! ## Registered Routes
//!
//! - `GET /documents` (`list`): documents the caller uploaded plus public ones.
//! - `POST /documents/upload-url` (`upload_url`): records the metadata and returns
//!   a pre-signed `PUT` URL for `{leadId}/{documentId}/{fileName}`.
//! - `GET /documents/{id}/download-url` (`download_url`): pre-signed `GET` URL,
//!   for the uploader or, on public documents, anyone.
//! - `PUT /documents/{id}` (`update`): uploader only, descriptive fields only.
//! - `DELETE /documents/{id}` (`delete`): uploader only; removes the object, then
//!   the metadata.

mod delete;
mod download_url;
mod list;
mod update;
mod upload_url;

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;
use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;
use crm_common::model::document::Document;

const API_PATH: &str = "/documents";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/upload-url", post().to(upload_url::process))
        .route("/{id}/download-url", get().to(download_url::process))
        .route("/{id}", put().to(update::process))
        .route("/{id}", delete().to(delete::process))
}

/// Loads the document and checks that the caller uploaded it.
async fn owned_document(state: &AppState, id: &str, caller: &Caller) -> Result<Document, ApiError> {
    let document = find(state, id).await?;
    if caller.owns(&document.uploaded_by) {
        Ok(document)
    } else {
        Err(ApiError::Forbidden)
    }
}

async fn find(state: &AppState, id: &str) -> Result<Document, ApiError> {
    state
        .store
        .get_item(state.documents_table(), id)
        .await?
        .ok_or(ApiError::NotFound("Document not found"))
}

#[cfg(test)]
mod tests {
    use crate::services::test_support::*;
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use crm_common::model::document::DocumentType;
    use crm_common::responses::{DocumentList, DownloadUrlResponse, ErrorBody, UploadUrlResponse};
    use crm_common::model::document::Document;
    use serde_json::{json, Value};

    fn upload_request(file_name: &str, is_public: bool) -> Value {
        json!({
            "leadId": LEAD_1,
            "fileName": file_name,
            "fileType": "application/pdf",
            "fileSize": 52_431,
            "documentType": "CLAIM_FORM",
            "description": "Signed claim form",
            "isPublic": is_public
        })
    }

    macro_rules! upload {
        ($app:expr, $caller:expr, $file_name:expr, $is_public:expr) => {{
            let req = as_caller(TestRequest::post().uri("/documents/upload-url"), $caller)
                .set_json(upload_request($file_name, $is_public))
                .to_request();
            let response = test::call_service($app, req).await;
            assert_eq!(response.status(), StatusCode::OK);
            read_json::<UploadUrlResponse>(response).await
        }};
    }

    macro_rules! list_ids {
        ($app:expr, $caller:expr, $uri:expr) => {{
            let req = as_caller(TestRequest::get().uri($uri), $caller).to_request();
            let response = test::call_service($app, req).await;
            assert_eq!(response.status(), StatusCode::OK);
            let list: DocumentList = read_json(response).await;
            let mut ids: Vec<String> = list.documents.into_iter().map(|d| d.id).collect();
            ids.sort();
            ids
        }};
    }

    #[actix_web::test]
    async fn upload_url_records_metadata_and_signs_the_object_key() {
        let (state, _blobs) = test_state();
        let app = test_app!(state);

        let body = upload!(&app, AGENT_1, "claim form.pdf", false);
        let document = &body.document;
        assert_eq!(body.document_id, document.id);
        assert_eq!(document.s3_key, format!("{LEAD_1}/{}/claim form.pdf", document.id));
        assert_eq!(document.uploaded_by, AGENT_1);
        assert_eq!(document.uploaded_at, document.updated_at);
        assert_eq!(document.document_type, DocumentType::ClaimForm);
        assert!(!document.is_public);
        assert!(body
            .upload_url
            .contains(&format!("/documents/{LEAD_1}/{}/claim%20form.pdf", document.id)));
        assert!(body.upload_url.contains("X-Crm-Method=PUT"));
        assert_eq!(document.file_size, 52_431.0);

        let req = as_caller(TestRequest::post().uri("/documents/upload-url"), AGENT_1)
            .set_json(upload_request("size.pdf", false))
            .to_request();
        let raw: Value = read_json(test::call_service(&app, req).await).await;
        assert_eq!(raw["document"]["fileSize"].to_string(), "52431");
    }

    #[actix_web::test]
    async fn private_documents_are_listed_only_for_their_uploader() {
        let (state, _blobs) = test_state();
        let app = test_app!(state);
        let private = upload!(&app, AGENT_1, "private.pdf", false).document_id;
        let public = upload!(&app, AGENT_2, "public.pdf", true).document_id;

        let mut both = vec![private.clone(), public.clone()];
        both.sort();
        assert_eq!(list_ids!(&app, AGENT_1, "/documents"), both);
        assert_eq!(list_ids!(&app, AGENT_2, "/documents"), vec![public.clone()]);

        let by_lead = format!("/documents?leadId={LEAD_1}");
        assert_eq!(list_ids!(&app, AGENT_1, &by_lead), both);
        assert_eq!(list_ids!(&app, AGENT_2, &by_lead), vec![public.clone()]);

        let mine = format!("/documents?uploadedBy={AGENT_1}");
        assert_eq!(list_ids!(&app, AGENT_2, &mine), Vec::<String>::new());
        assert_eq!(list_ids!(&app, AGENT_2, "/documents?searchTerm=public"), vec![public]);
    }

    #[actix_web::test]
    async fn download_urls_respect_ownership_and_the_public_flag() {
        let (state, _blobs) = test_state();
        let app = test_app!(state);
        let private = upload!(&app, AGENT_1, "private.pdf", false).document_id;
        let public = upload!(&app, AGENT_1, "public.pdf", true).document_id;

        let uri = format!("/documents/{private}/download-url");
        let req = as_caller(TestRequest::get().uri(&uri), AGENT_1).to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: DownloadUrlResponse = read_json(response).await;
        assert_eq!(body.document_id, private);
        assert!(body.download_url.contains("X-Crm-Method=GET"));

        let req = as_caller(TestRequest::get().uri(&uri), AGENT_2).to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.message, "Access denied");

        let uri = format!("/documents/{public}/download-url");
        let req = as_caller(TestRequest::get().uri(&uri), AGENT_2).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = as_caller(TestRequest::get().uri("/documents/missing/download-url"), AGENT_1).to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.message, "Document not found");

        let req = as_caller(TestRequest::get().uri("/documents/%20/download-url"), AGENT_1).to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.message, "Document ID is required");
    }

    #[actix_web::test]
    async fn only_the_uploader_may_update() {
        let (state, _blobs) = test_state();
        let app = test_app!(state);
        let uploaded = upload!(&app, AGENT_1, "policy.pdf", false).document;
        let uri = format!("/documents/{}", uploaded.id);

        let req = as_caller(TestRequest::put().uri(&uri), AGENT_2)
            .set_json(json!({ "isPublic": true }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = as_caller(TestRequest::put().uri(&uri), AGENT_1)
            .set_json(json!({ "isPublic": true, "documentType": "INSURANCE_POLICY", "fileName": "x.exe" }))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Document = read_json(response).await;
        assert!(updated.is_public);
        assert_eq!(updated.document_type, DocumentType::InsurancePolicy);
        assert_eq!(updated.file_name, "policy.pdf");
        assert_eq!(updated.s3_key, uploaded.s3_key);
        assert_eq!(updated.uploaded_at, uploaded.uploaded_at);

        let req = as_caller(TestRequest::put().uri(&uri), AGENT_1)
            .set_json(json!({ "isPublic": "yes" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn delete_removes_the_object_then_the_metadata() {
        let (state, blobs) = test_state();
        let app = test_app!(state);
        let uploaded = upload!(&app, AGENT_1, "id.png", false).document;
        let object = blobs.path().join("documents").join(&uploaded.s3_key);
        std::fs::create_dir_all(object.parent().unwrap()).unwrap();
        std::fs::write(&object, b"png").unwrap();
        let uri = format!("/documents/{}", uploaded.id);

        let req = as_caller(TestRequest::delete().uri(&uri), AGENT_2).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
        assert!(object.exists());

        let req = as_caller(TestRequest::delete().uri(&uri), AGENT_1).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        assert!(!object.exists());

        let req = as_caller(TestRequest::delete().uri(&uri), AGENT_1).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
