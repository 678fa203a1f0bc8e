//! Opaque continuation tokens.
//!
//! A token is the store's last-evaluated key, serialized to JSON and base64 encoded.
//! Clients treat it as an opaque string and hand it back as `nextToken`.

use crate::error::ApiError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(cursor: &T) -> Result<String, ApiError> {
    let json = serde_json::to_vec(cursor)?;
    Ok(BASE64.encode(json))
}

/// Malformed base64, invalid JSON and JSON of the wrong shape are all client errors.
pub fn decode<T: DeserializeOwned>(token: &str) -> Result<T, ApiError> {
    let bytes = BASE64
        .decode(token.trim())
        .map_err(|_| ApiError::InvalidPaginationToken)?;
    serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidPaginationToken)
}
