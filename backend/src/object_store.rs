//! # Object Storage
//!
//! Issues time-limited URLs for uploading and downloading blobs, verifies them when
//! they are presented back to `/objects`, and reads, writes and deletes the blobs.
//! Buckets are sub-directories of the configured root; an object key maps to a path
//! below its bucket.
//!
//! A pre-signed URL is `{public_base_url}/{bucket}/{key}` plus query parameters naming
//! the allowed method, the expiry (unix seconds), the content type for uploads, and a
//! signature: a BLAKE3 keyed hash over those values under a key derived from the
//! configured secret. Whoever holds the URL may perform that one operation on that one
//! object until it expires; no other credential is needed.

use crate::config::ObjectStoreConfig;
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

const KEY_CONTEXT: &str = "claims-crm 2024 object-store url signing";

pub const METHOD_PARAM: &str = "X-Crm-Method";
pub const EXPIRES_PARAM: &str = "X-Crm-Expires";
pub const CONTENT_TYPE_PARAM: &str = "X-Crm-Content-Type";
pub const SIGNATURE_PARAM: &str = "X-Crm-Signature";

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("invalid object key '{0}'")]
    InvalidKey(String),
    #[error("invalid public base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("public base url '{0}' cannot carry a path")]
    CannotBeABase(String),
    #[error("url expiry of {0} seconds is out of range")]
    Expiry(u64),
    #[error("object exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("upload body could not be read: {0}")]
    Body(String),
    #[error("failed to write object {bucket}/{key}: {source}")]
    Write {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read object {bucket}/{key}: {source}")]
    Read {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete object {bucket}/{key}: {source}")]
    Delete {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a presented URL does not authorize the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlRejection {
    #[error("signature parameters are missing or malformed")]
    Malformed,
    #[error("url was signed for another method")]
    WrongMethod,
    #[error("url has expired")]
    Expired,
    #[error("content type differs from the signed one")]
    ContentType,
    #[error("signature does not match")]
    Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMethod {
    Get,
    Put,
}

impl UrlMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
    base_url: Url,
    signing_key: [u8; 32],
    expires_in: u64,
    max_object_bytes: u64,
}

impl BlobStore {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        let base_url = Url::parse(&config.public_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ObjectStoreError::CannotBeABase(config.public_base_url.clone()));
        }
        let secret = match &config.signing_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("No object store signing secret configured; pre-signed URLs will not survive a restart");
                uuid::Uuid::new_v4().to_string()
            }
        };
        Ok(Self {
            root: config.root.clone(),
            base_url,
            signing_key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            expires_in: config.url_expiry_secs,
            max_object_bytes: config.max_object_bytes,
        })
    }

    /// URL through which a client may `PUT` the object body, with the given content type.
    pub fn upload_url(&self, bucket: &str, key: &str, content_type: &str) -> Result<String, ObjectStoreError> {
        self.presign(UrlMethod::Put, bucket, key, Some(content_type))
    }

    pub fn download_url(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError> {
        self.presign(UrlMethod::Get, bucket, key, None)
    }

    fn presign(
        &self,
        method: UrlMethod,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<String, ObjectStoreError> {
        let segments = key_segments(key)?;
        let expires = i64::try_from(self.expires_in)
            .ok()
            .and_then(|secs| Utc::now().timestamp().checked_add(secs))
            .ok_or(ObjectStoreError::Expiry(self.expires_in))?;
        let signature = self.sign(method, bucket, key, expires, content_type.unwrap_or(""));

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ObjectStoreError::CannotBeABase(self.base_url.to_string()))?
            .pop_if_empty()
            .push(bucket)
            .extend(segments);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(METHOD_PARAM, method.as_str());
            query.append_pair(EXPIRES_PARAM, &expires.to_string());
            if let Some(content_type) = content_type {
                query.append_pair(CONTENT_TYPE_PARAM, content_type);
            }
            query.append_pair(SIGNATURE_PARAM, &signature.to_hex());
        }
        Ok(url.to_string())
    }

    fn sign(&self, method: UrlMethod, bucket: &str, key: &str, expires: i64, content_type: &str) -> blake3::Hash {
        let payload = format!("{}\n{}\n{}\n{}\n{}", method.as_str(), bucket, key, expires, content_type);
        blake3::keyed_hash(&self.signing_key, payload.as_bytes())
    }

    /// Checks the query of a presented URL against the request it arrived with.
    ///
    /// `content_type` is the request's `Content-Type`; uploads must repeat the signed one.
    pub fn verify(
        &self,
        method: UrlMethod,
        bucket: &str,
        key: &str,
        params: &HashMap<String, String>,
        content_type: Option<&str>,
    ) -> Result<(), UrlRejection> {
        let signed_method = params.get(METHOD_PARAM).ok_or(UrlRejection::Malformed)?;
        let expires: i64 = params
            .get(EXPIRES_PARAM)
            .and_then(|raw| raw.parse().ok())
            .ok_or(UrlRejection::Malformed)?;
        let signature = params
            .get(SIGNATURE_PARAM)
            .and_then(|raw| blake3::Hash::from_hex(raw).ok())
            .ok_or(UrlRejection::Malformed)?;
        if key_segments(key).is_err() {
            return Err(UrlRejection::Malformed);
        }

        if signed_method != method.as_str() {
            return Err(UrlRejection::WrongMethod);
        }
        let signed_type = params.get(CONTENT_TYPE_PARAM).map(String::as_str);
        let signed_type = match method {
            UrlMethod::Put => {
                let signed = signed_type.ok_or(UrlRejection::Malformed)?;
                if content_type != Some(signed) {
                    return Err(UrlRejection::ContentType);
                }
                signed
            }
            UrlMethod::Get => {
                if signed_type.is_some() {
                    return Err(UrlRejection::Malformed);
                }
                ""
            }
        };

        // blake3::Hash equality runs in constant time.
        if self.sign(method, bucket, key, expires, signed_type) != signature {
            return Err(UrlRejection::Signature);
        }
        if Utc::now().timestamp() > expires {
            return Err(UrlRejection::Expired);
        }
        Ok(())
    }

    /// Streams `body` into the object, replacing any previous content. Returns the size.
    ///
    /// The bytes land in a sibling temporary file that is renamed into place once the
    /// body is complete, so readers never see a partial object.
    pub async fn put_object<S, B, E>(&self, bucket: &str, key: &str, mut body: S) -> Result<u64, ObjectStoreError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Display,
    {
        let path = self.object_path(bucket, key)?;
        let partial = path.with_file_name(format!(".{}.part", uuid::Uuid::new_v4()));
        let write_error = |source| ObjectStoreError::Write {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        let result = async {
            let mut file = tokio::fs::File::create(&partial).await.map_err(write_error)?;
            let mut written: u64 = 0;
            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| ObjectStoreError::Body(e.to_string()))?;
                let chunk = chunk.as_ref();
                written = written.saturating_add(chunk.len() as u64);
                if written > self.max_object_bytes {
                    return Err(ObjectStoreError::TooLarge {
                        limit: self.max_object_bytes,
                    });
                }
                file.write_all(chunk).await.map_err(write_error)?;
            }
            file.flush().await.map_err(write_error)?;
            tokio::fs::rename(&partial, &path).await.map_err(write_error)?;
            Ok::<u64, ObjectStoreError>(written)
        }
        .await;

        match result {
            Ok(written) => {
                info!("Stored object {}/{} ({} bytes)", bucket, key, written);
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    debug!("No partial upload to remove at {}: {}", partial.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// Removes the object. Deleting an object that does not exist is not an error.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted object {}/{}", bucket, key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ObjectStoreError::Delete {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Location of the object on disk.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let bucket_segments = key_segments(bucket)?;
        let mut path = self.root.clone();
        path.extend(bucket_segments);
        path.extend(key_segments(key)?);
        Ok(path)
    }
}

/// Whether `key` names an object inside a bucket: `/`-separated, non-empty segments,
/// none of them `.` or `..`, no backslashes.
pub fn is_valid_key(key: &str) -> bool {
    key_segments(key).is_ok()
}

/// Splits a key on `/`, rejecting anything that could escape the bucket directory.
fn key_segments(key: &str) -> Result<Vec<&str>, ObjectStoreError> {
    let segments: Vec<&str> = key.split('/').collect();
    let valid = !key.is_empty()
        && segments.iter().all(|segment| {
            let mut components = Path::new(segment).components();
            matches!(components.next(), Some(Component::Normal(_)))
                && components.next().is_none()
                && !segment.contains('\\')
        });
    if valid {
        Ok(segments)
    } else {
        Err(ObjectStoreError::InvalidKey(key.to_string()))
    }
}
