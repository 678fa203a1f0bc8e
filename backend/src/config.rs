//! # Service Configuration
//!
//! All deployment-specific settings (listen address, table and bucket names, signing
//! secret, ...) live in one `Config` value that is built once at startup and handed to
//! `AppState`. Nothing reads the environment after that point.
//!
//! Loading order:
//! 1. Built-in defaults (see the `default_*` functions).
//! 2. The TOML file named by `CRM_CONFIG`, if set.
//! 3. Individual `CRM_*` environment variables, which win over the file.

use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable holding the path of the optional TOML file.
pub const CONFIG_PATH_VAR: &str = "CRM_CONFIG";

/// Longest validity a pre-signed URL may be given: seven days.
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for {var}")]
    InvalidValue { var: &'static str, value: String },
    #[error("invalid table name '{0}': only ASCII letters, digits and '_' are allowed")]
    InvalidTableName(String),
    #[error("url expiry must be between 1 and {MAX_URL_EXPIRY_SECS} seconds, got {0}")]
    InvalidUrlExpiry(u64),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tables: TableConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted JSON body, in bytes.
    #[serde(default = "default_json_limit")]
    pub json_limit: usize,
    /// Build output of the single-page app. When unset, unknown paths answer 404.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// SQLite file backing the key-value tables. `:memory:` keeps everything in memory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_leads_table")]
    pub leads: String,
    #[serde(default = "default_documents_table")]
    pub documents: String,
    #[serde(default = "default_calls_table")]
    pub calls: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Directory under which each bucket is a sub-directory.
    #[serde(default = "default_object_root")]
    pub root: PathBuf,
    /// Origin that pre-signed URLs point at. The default targets this service's own
    /// `/objects` routes; point it elsewhere when another server holds the objects.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_documents_bucket")]
    pub documents_bucket: String,
    #[serde(default = "default_recordings_bucket")]
    pub recordings_bucket: String,
    /// Secret the URL signing key is derived from. A random one is generated when unset,
    /// which invalidates outstanding URLs on restart.
    #[serde(default)]
    pub signing_secret: Option<String>,
    /// Validity of pre-signed URLs, in seconds.
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
    /// Largest object accepted through an upload URL, in bytes.
    #[serde(default = "default_max_object_bytes")]
    pub max_object_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Header in which the upstream authorizer forwards the caller's subject claim.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_json_limit() -> usize {
    10 * 1024 * 1024
}

fn default_database_path() -> String {
    "crm.sqlite".to_string()
}

fn default_leads_table() -> String {
    "leads".to_string()
}

fn default_documents_table() -> String {
    "documents".to_string()
}

fn default_calls_table() -> String {
    "calls".to_string()
}

fn default_object_root() -> PathBuf {
    PathBuf::from("objects")
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:8080/objects/".to_string()
}

fn default_documents_bucket() -> String {
    "documents".to_string()
}

fn default_recordings_bucket() -> String {
    "recordings".to_string()
}

fn default_url_expiry_secs() -> u64 {
    3600
}

fn default_max_object_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_identity_header() -> String {
    "x-auth-subject".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            json_limit: default_json_limit(),
            static_dir: None,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            leads: default_leads_table(),
            documents: default_documents_table(),
            calls: default_calls_table(),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            root: default_object_root(),
            public_base_url: default_public_base_url(),
            documents_bucket: default_documents_bucket(),
            recordings_bucket: default_recordings_bucket(),
            signing_secret: None,
            url_expiry_secs: default_url_expiry_secs(),
            max_object_bytes: default_max_object_bytes(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
        }
    }
}

impl Config {
    /// Loads the configuration from `CRM_CONFIG` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Applies `CRM_*` overrides obtained from `lookup`.
    ///
    /// Taking a lookup function instead of reading the environment directly keeps
    /// this testable without mutating process state.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        set_string(&lookup, "CRM_HOST", &mut self.server.host);
        set_parsed(&lookup, "CRM_PORT", &mut self.server.port)?;
        set_parsed(&lookup, "CRM_JSON_LIMIT", &mut self.server.json_limit)?;
        if let Some(dir) = lookup("CRM_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }

        set_string(&lookup, "CRM_DATABASE_PATH", &mut self.tables.database_path);
        set_string(&lookup, "CRM_LEADS_TABLE", &mut self.tables.leads);
        set_string(&lookup, "CRM_DOCUMENTS_TABLE", &mut self.tables.documents);
        set_string(&lookup, "CRM_CALLS_TABLE", &mut self.tables.calls);

        if let Some(root) = lookup("CRM_OBJECT_ROOT") {
            self.object_store.root = PathBuf::from(root);
        }
        set_string(&lookup, "CRM_PUBLIC_BASE_URL", &mut self.object_store.public_base_url);
        set_string(&lookup, "CRM_DOCUMENTS_BUCKET", &mut self.object_store.documents_bucket);
        set_string(&lookup, "CRM_RECORDINGS_BUCKET", &mut self.object_store.recordings_bucket);
        if let Some(secret) = lookup("CRM_SIGNING_SECRET") {
            self.object_store.signing_secret = Some(secret);
        }
        set_parsed(&lookup, "CRM_URL_EXPIRY_SECS", &mut self.object_store.url_expiry_secs)?;
        set_parsed(&lookup, "CRM_MAX_OBJECT_BYTES", &mut self.object_store.max_object_bytes)?;

        set_string(&lookup, "CRM_IDENTITY_HEADER", &mut self.auth.identity_header);
        Ok(())
    }

    /// Table names end up inside SQL statements, so they are restricted to identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for table in [&self.tables.leads, &self.tables.documents, &self.tables.calls] {
            if !is_identifier(table) {
                return Err(ConfigError::InvalidTableName(table.clone()));
            }
        }
        let expiry = self.object_store.url_expiry_secs;
        if !(1..=MAX_URL_EXPIRY_SECS).contains(&expiry) {
            return Err(ConfigError::InvalidUrlExpiry(expiry));
        }
        Ok(())
    }
}

pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn set_string<F>(lookup: &F, var: &'static str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(var) {
        *target = value;
    }
}

fn set_parsed<F, T>(lookup: &F, var: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(var) {
        *target = value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.object_store.url_expiry_secs, 3600);
        assert_eq!(config.auth.identity_header, "x-auth-subject");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_sections_are_partial() {
        let config: Config = toml::from_str(
            r#"
            [tables]
            leads = "crm_leads"

            [object_store]
            url_expiry_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.tables.leads, "crm_leads");
        assert_eq!(config.tables.calls, "calls");
        assert_eq!(config.object_store.url_expiry_secs, 60);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn environment_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CRM_PORT", "9000"),
            ("CRM_CALLS_TABLE", "agent_calls"),
            ("CRM_SIGNING_SECRET", "s3cret"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.tables.calls, "agent_calls");
        assert_eq!(config.object_store.signing_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn rejects_unparsable_numbers_and_bad_table_names() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|var| (var == "CRM_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "CRM_PORT", .. }));

        config.tables.leads = "leads; DROP TABLE calls".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTableName(_))
        ));
    }

    #[test]
    fn url_expiry_is_bounded() {
        let mut config = Config::default();
        for expiry in [0, MAX_URL_EXPIRY_SECS + 1, u64::MAX] {
            config.object_store.url_expiry_secs = expiry;
            assert!(matches!(config.validate(), Err(ConfigError::InvalidUrlExpiry(e)) if e == expiry));
        }
        config.object_store.url_expiry_secs = MAX_URL_EXPIRY_SECS;
        assert!(config.validate().is_ok());
    }
}
