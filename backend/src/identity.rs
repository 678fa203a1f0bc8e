//! Caller identity.
//!
//! Authentication happens upstream: the authorizer in front of the service verifies
//! the caller and forwards its subject claim in a header (`auth.identity_header`).
//! Handlers that need the caller take a `Caller` argument; a request without the
//! header is rejected with `401` before the handler runs.

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(String);

impl Caller {
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    pub fn subject(&self) -> &str {
        &self.0
    }

    pub fn owns(&self, owner: &str) -> bool {
        self.0 == owner
    }
}

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let header = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.config.auth.identity_header.clone(),
            None => AuthConfig::default().identity_header,
        };
        let subject = req
            .headers()
            .get(header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|subject| !subject.is_empty());

        ready(match subject {
            Some(subject) => Ok(Caller::new(subject)),
            None => {
                debug!("Rejecting {} {}: no {} header", req.method(), req.path(), header);
                Err(ApiError::Unauthenticated)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn reads_the_subject_from_the_default_header() {
        let req = TestRequest::default()
            .insert_header(("x-auth-subject", "agent-1"))
            .to_http_request();
        let caller = Caller::extract(&req).await.unwrap();
        assert_eq!(caller.subject(), "agent-1");
        assert!(caller.owns("agent-1"));
        assert!(!caller.owns("agent-2"));
    }

    #[actix_web::test]
    async fn missing_or_blank_subject_is_unauthenticated() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(Caller::extract(&req).await, Err(ApiError::Unauthenticated)));

        let req = TestRequest::default()
            .insert_header(("x-auth-subject", "   "))
            .to_http_request();
        assert!(matches!(Caller::extract(&req).await, Err(ApiError::Unauthenticated)));
    }
}
