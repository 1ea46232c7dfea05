// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Remote parameter fetching.
//!
//! Credential configurations can be stored as (optionally encrypted)
//! SSM parameters and referenced by ARN from `GOOGLE_APPLICATION_CREDENTIALS`.

use async_trait::async_trait;

use crate::constants::SSM_SERVICE;
use crate::errors::{BoxError, BrokerError};
use crate::locator::ResourceLocator;

/// Source of raw parameter values.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetches the decrypted value of the named parameter.
    async fn fetch_parameter(&self, name: &str) -> Result<Vec<u8>, BoxError>;
}

#[async_trait]
impl ParameterStore for aws_sdk_ssm::Client {
    async fn fetch_parameter(&self, name: &str) -> Result<Vec<u8>, BoxError> {
        let output = self
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await?;

        let value = output
            .parameter()
            .and_then(|parameter| parameter.value())
            .ok_or_else(|| format!("parameter {name} has no value"))?;

        Ok(value.as_bytes().to_vec())
    }
}

/// Fails with [`BrokerError::UnsupportedSource`] for anything but SSM.
pub fn ensure_supported(locator: &ResourceLocator) -> Result<(), BrokerError> {
    if locator.service == SSM_SERVICE {
        Ok(())
    } else {
        Err(BrokerError::UnsupportedSource {
            service: locator.service.clone(),
            locator: locator.to_string(),
        })
    }
}

/// Fetches the credential configuration bytes a locator points at.
#[tracing::instrument(skip(store, locator), fields(locator = %locator))]
pub async fn fetch(
    store: &dyn ParameterStore,
    locator: &ResourceLocator,
) -> Result<Vec<u8>, BrokerError> {
    ensure_supported(locator)?;
    let name = locator.parameter_name()?;

    tracing::debug!("[broker] fetching credentials from parameter {}", name);

    store
        .fetch_parameter(&name)
        .await
        .map_err(|source| BrokerError::RemoteFetchFailed { name, source })
}
