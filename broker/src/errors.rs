// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::constants::PROJECT_NUMBER_ENV;

/// Boxed error returned by injected collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum BrokerError {
    #[error(
        "no credential source configured: set {path_var} or all of {}",
        .workload_vars.join(", ")
    )]
    ConfigurationMissing {
        path_var: &'static str,
        workload_vars: [&'static str; 4],
    },
    #[error("unsupported remote credential source: {service} ({locator})")]
    UnsupportedSource { service: String, locator: String },
    #[error("failed to fetch parameter {name}")]
    RemoteFetchFailed {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("invalid locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },
    #[error("failed to read credentials file {}", .path.display())]
    CredentialFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {env} value {value:?}", env = PROJECT_NUMBER_ENV)]
    InvalidProjectNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("empty credentials")]
    EmptyCredentials,
    #[error("invalid credentials: not JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error("failed to unmarshal credentials")]
    MalformedCredentials(#[source] serde_json::Error),
    #[error("failed to marshal credentials")]
    Serialization(#[source] serde_json::Error),
    #[error("failed to start metadata proxy")]
    ProxyStartFailed(#[source] std::io::Error),
    #[error("failed to shutdown metadata proxy: {0}")]
    ProxyShutdownFailed(String),
    #[error("aws configuration error: {0}")]
    AwsConfig(String),
    #[error("{0}")]
    UnderlyingCredentialFailed(String),
}

/// Renders an error with its full source chain, `outer: inner: root`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        tracing::error!("[broker] metadata request failed: {}", self);

        // Mirrors the failure document of the instance metadata service.
        let body = Json(json!({"Code": "Failed", "Message": self.to_string()}));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
