//! Endpoint configuration and credentials loading.

use crate::error::SyncError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Base URL for the SIS enrollments API (v2).
const SIS_ENROLLMENTS_URL: &str = "https://apis.berkeley.edu/sis/v2/enrollments";
/// Base URL for the SIS class-sections API (v1).
const SIS_CLASSES_URL: &str = "https://apis.berkeley.edu/sis/v1/classes/sections";
/// Base URL for the SIS terms API (v1).
const SIS_TERMS_URL: &str = "https://apis.berkeley.edu/sis/v1/terms";
/// Base URL for the Grouper web-services REST API.
const DIRECTORY_URL: &str = "https://calgroups.berkeley.edu/gws/servicesRest/json/v2_2_100";

/// Configuration for the SIS client.
#[derive(Debug, Clone)]
pub struct SisConfig {
    /// Base URL for the enrollments API family
    pub enrollments_url: String,
    /// Base URL for the class-sections API family
    pub classes_url: String,
    /// Base URL for the terms API family
    pub terms_url: String,
    /// Connect timeout for SIS requests
    pub connect_timeout: Duration,
    /// Overall request timeout for SIS requests
    pub request_timeout: Duration,
}

impl Default for SisConfig {
    fn default() -> Self {
        Self {
            enrollments_url: SIS_ENROLLMENTS_URL.to_string(),
            classes_url: SIS_CLASSES_URL.to_string(),
            terms_url: SIS_TERMS_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Configuration for the group-directory client.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL for the directory REST API
    pub base_url: String,
    /// Connect timeout for directory requests
    pub connect_timeout: Duration,
    /// Overall request timeout for directory requests
    pub request_timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: DIRECTORY_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// An app id/key pair for one SIS API family.
#[derive(Debug, Clone, Deserialize)]
pub struct SisKey {
    pub app_id: String,
    pub app_key: String,
}

/// Keys that must be present in the credentials file.
const REQUIRED_KEYS: [&str; 8] = [
    "sis_enrollments_id",
    "sis_enrollments_key",
    "sis_classes_id",
    "sis_classes_key",
    "sis_terms_id",
    "sis_terms_key",
    "grouper_user",
    "grouper_pass",
];

/// API credentials for both remote services, as stored in the local
/// credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub sis_enrollments_id: String,
    pub sis_enrollments_key: String,
    pub sis_classes_id: String,
    pub sis_classes_key: String,
    pub sis_terms_id: String,
    pub sis_terms_key: String,
    pub grouper_user: String,
    pub grouper_pass: String,
}

impl Credentials {
    /// Reads and validates credentials from a JSON file.
    ///
    /// The file must contain every key in [`REQUIRED_KEYS`]; the error
    /// message names all missing keys so a misconfigured file can be
    /// fixed in one pass.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Err(SyncError::Config {
                message: format!("no such file: {}", path.display()),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            SyncError::Config { message } => SyncError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Parses credentials from a JSON string, auditing required keys.
    pub fn from_json(content: &str) -> Result<Self, SyncError> {
        let data: serde_json::Value =
            serde_json::from_str(content).map_err(|e| SyncError::Config {
                message: format!("invalid JSON: {e}"),
            })?;
        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .filter(|k| data.get(**k).and_then(|v| v.as_str()).is_none())
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::Config {
                message: format!("missing parameters: {}", missing.join(", ")),
            });
        }
        serde_json::from_value(data).map_err(|e| SyncError::Config {
            message: e.to_string(),
        })
    }

    /// The id/key pair for the enrollments API.
    pub fn enrollments_key(&self) -> SisKey {
        SisKey {
            app_id: self.sis_enrollments_id.clone(),
            app_key: self.sis_enrollments_key.clone(),
        }
    }

    /// The id/key pair for the class-sections API.
    pub fn classes_key(&self) -> SisKey {
        SisKey {
            app_id: self.sis_classes_id.clone(),
            app_key: self.sis_classes_key.clone(),
        }
    }

    /// The id/key pair for the terms API.
    pub fn terms_key(&self) -> SisKey {
        SisKey {
            app_id: self.sis_terms_id.clone(),
            app_key: self.sis_terms_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_credentials() -> String {
        serde_json::json!({
            "sis_enrollments_id": "e-id",
            "sis_enrollments_key": "e-key",
            "sis_classes_id": "c-id",
            "sis_classes_key": "c-key",
            "sis_terms_id": "t-id",
            "sis_terms_key": "t-key",
            "grouper_user": "svc-user",
            "grouper_pass": "svc-pass"
        })
        .to_string()
    }

    #[test]
    fn parses_complete_credentials() {
        let creds = Credentials::from_json(&full_credentials()).unwrap();
        assert_eq!(creds.enrollments_key().app_id, "e-id");
        assert_eq!(creds.classes_key().app_key, "c-key");
        assert_eq!(creds.terms_key().app_id, "t-id");
        assert_eq!(creds.grouper_user, "svc-user");
    }

    #[test]
    fn reports_all_missing_keys() {
        let err = Credentials::from_json(r#"{"sis_enrollments_id": "e-id"}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sis_enrollments_key"));
        assert!(message.contains("grouper_pass"));
        assert!(!message.contains("sis_enrollments_id,"));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = Credentials::from_json("not json").unwrap_err();
        assert!(err.is_config());
    }
}
