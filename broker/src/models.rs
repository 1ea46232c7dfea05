// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use aws_credential_types::Credentials;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::ZeroizeOnDrop;

use crate::constants::{EXTERNAL_ACCOUNT_TYPE, METADATA_CREDENTIAL_TYPE};

/// Credential configuration consumed by Google client libraries
/// (`GOOGLE_APPLICATION_CREDENTIALS` format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialConfig {
    #[serde(rename = "type", default)]
    pub credential_type: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub subject_token_type: String,
    #[serde(default)]
    pub service_account_impersonation_url: String,
    #[serde(default)]
    pub token_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_source: Option<CredentialSource>,
    /// Fields we do not interpret, carried through re-serialization.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialSource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub environment_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regional_cred_verification_url: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CredentialConfig {
    /// External account configurations exchange short-lived tokens and
    /// may need their credential source rewritten.
    pub fn is_temporary(&self) -> bool {
        self.credential_type == EXTERNAL_ACCOUNT_TYPE
    }

    pub fn kind(&self) -> CredentialType {
        CredentialType::from(self.credential_type.as_str())
    }

    /// Returns true when the token must be read from a local file.
    pub fn has_file_source(&self) -> bool {
        self.credential_source
            .as_ref()
            .is_some_and(|source| !source.file.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialType {
    ServiceAccount,
    AuthorizedUser,
    ImpersonatedServiceAccount,
    ExternalAccount,
    /// Unrecognized type tags are passed through untouched.
    Other(String),
}

impl CredentialType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ServiceAccount => "service_account",
            Self::AuthorizedUser => "authorized_user",
            Self::ImpersonatedServiceAccount => "impersonated_service_account",
            Self::ExternalAccount => EXTERNAL_ACCOUNT_TYPE,
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for CredentialType {
    fn from(value: &str) -> Self {
        match value {
            "service_account" => Self::ServiceAccount,
            "authorized_user" => Self::AuthorizedUser,
            "impersonated_service_account" => Self::ImpersonatedServiceAccount,
            EXTERNAL_ACCOUNT_TYPE => Self::ExternalAccount,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved credential configuration ready to hand to a Google client.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialOption {
    pub credential_type: CredentialType,
    pub json: Vec<u8>,
    pub config: CredentialConfig,
}

impl CredentialOption {
    pub fn new(json: Vec<u8>, config: CredentialConfig) -> Self {
        Self {
            credential_type: config.kind(),
            json,
            config,
        }
    }
}

/// Temporary AWS credentials served by the metadata proxy.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[zeroize(skip)]
    pub expiration: Option<SystemTime>,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl From<Credentials> for Credential {
    fn from(credential: Credentials) -> Self {
        let token = match credential.session_token() {
            Some(token) => token.to_string(),
            None => "".to_string(),
        };

        Self {
            access_key_id: credential.access_key_id().to_string(),
            secret_access_key: credential.secret_access_key().to_string(),
            session_token: token,
            expiration: credential.expiry(),
        }
    }
}

/// Body of `GET /latest/meta-data/iam/security-credentials/default`.
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct MetadataCredentials {
    #[serde(rename = "Code")]
    #[zeroize(skip)]
    pub code: String,
    #[serde(rename = "LastUpdated")]
    #[zeroize(skip)]
    pub last_updated: String,
    #[serde(rename = "Type")]
    #[zeroize(skip)]
    pub credential_type: String,
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "Expiration")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[zeroize(skip)]
    pub expiration: Option<String>,
}

impl fmt::Debug for MetadataCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataCredentials")
            .field("code", &self.code)
            .field("last_updated", &self.last_updated)
            .field("credential_type", &self.credential_type)
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl MetadataCredentials {
    pub fn success(credential: &Credential, now: DateTime<Utc>) -> Self {
        Self {
            code: "Success".to_string(),
            last_updated: rfc3339(now),
            credential_type: METADATA_CREDENTIAL_TYPE.to_string(),
            access_key_id: credential.access_key_id.clone(),
            secret_access_key: credential.secret_access_key.clone(),
            token: credential.session_token.clone(),
            expiration: credential
                .expiration
                .map(|expiration| rfc3339(DateTime::<Utc>::from(expiration))),
        }
    }
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
