// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use base64::{Engine as _, prelude::BASE64_STANDARD};
use serde::de::IgnoredAny;

use crate::errors::BrokerError;
use crate::models::CredentialConfig;

/// Decodes a credential configuration that may be base64 encoded JSON or
/// plain JSON.
///
/// Base64 is tried first. Input that is valid base64 but does not decode to
/// JSON is rejected even if the raw bytes were JSON.
pub fn parse_credentials(raw: &[u8]) -> Result<(Vec<u8>, CredentialConfig), BrokerError> {
    if raw.is_empty() {
        return Err(BrokerError::EmptyCredentials);
    }

    let json = base64_decode(raw).unwrap_or_else(|| raw.to_vec());

    serde_json::from_slice::<IgnoredAny>(&json).map_err(BrokerError::InvalidJson)?;
    let config: CredentialConfig =
        serde_json::from_slice(&json).map_err(BrokerError::MalformedCredentials)?;

    Ok((json, config))
}

// Line breaks are ignored, so wrapped or newline-terminated files decode.
fn base64_decode(raw: &[u8]) -> Option<Vec<u8>> {
    let compact: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|byte| !matches!(byte, b'\r' | b'\n'))
        .collect();
    BASE64_STANDARD.decode(compact).ok()
}
