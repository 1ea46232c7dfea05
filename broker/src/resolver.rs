// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Decides where a credential configuration comes from.
//!
//! Precedence (the cache is consulted by the broker before any of these):
//!
//! 1. `GOOGLE_APPLICATION_CREDENTIALS` naming an `arn:` locator or a local file
//! 2. the four workload identity variables, from which an external account
//!    configuration is synthesized
//! 3. otherwise [`BrokerError::ConfigurationMissing`]

use std::path::PathBuf;

use crate::configuration::{CredentialInputs, non_empty};
use crate::constants::{
    CREDENTIALS_PATH_ENV, EXTERNAL_ACCOUNT_TYPE, SUBJECT_TOKEN_TYPE_AWS, TOKEN_URL,
    WORKLOAD_IDENTITY_ENVS,
};
use crate::errors::BrokerError;
use crate::locator::{self, ResourceLocator};
use crate::models::CredentialConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    Remote(ResourceLocator),
    File(PathBuf),
    WorkloadIdentity(WorkloadIdentity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadIdentity {
    pub project_number: u64,
    pub pool_id: String,
    pub provider_id: String,
    pub service_account_email: String,
}

pub fn classify(inputs: &CredentialInputs) -> Result<ConfigOrigin, BrokerError> {
    if let Some(path) = non_empty(&inputs.credentials_path) {
        if locator::is_remote(path) {
            return Ok(ConfigOrigin::Remote(path.parse()?));
        }
        return Ok(ConfigOrigin::File(PathBuf::from(path)));
    }

    match (
        non_empty(&inputs.project_number),
        non_empty(&inputs.pool_id),
        non_empty(&inputs.provider_id),
        non_empty(&inputs.service_account_email),
    ) {
        (Some(project_number), Some(pool_id), Some(provider_id), Some(email)) => {
            let project_number =
                project_number
                    .parse()
                    .map_err(|source| BrokerError::InvalidProjectNumber {
                        value: project_number.to_string(),
                        source,
                    })?;
            Ok(ConfigOrigin::WorkloadIdentity(WorkloadIdentity {
                project_number,
                pool_id: pool_id.to_string(),
                provider_id: provider_id.to_string(),
                service_account_email: email.to_string(),
            }))
        }
        _ => Err(BrokerError::ConfigurationMissing {
            path_var: CREDENTIALS_PATH_ENV,
            workload_vars: WORKLOAD_IDENTITY_ENVS,
        }),
    }
}

impl WorkloadIdentity {
    pub fn audience(&self) -> String {
        format!(
            "//iam.googleapis.com/projects/{}/locations/global/workloadIdentityPools/{}/providers/{}",
            self.project_number, self.pool_id, self.provider_id
        )
    }

    pub fn impersonation_url(&self) -> String {
        format!(
            "https://iamcredentials.googleapis.com/v1/projects/-/serviceAccounts/{}:generateAccessToken",
            self.service_account_email
        )
    }

    /// External account configuration federating AWS credentials into the pool.
    pub fn to_config(&self) -> CredentialConfig {
        CredentialConfig {
            credential_type: EXTERNAL_ACCOUNT_TYPE.to_string(),
            audience: self.audience(),
            subject_token_type: SUBJECT_TOKEN_TYPE_AWS.to_string(),
            service_account_impersonation_url: self.impersonation_url(),
            token_url: TOKEN_URL.to_string(),
            ..Default::default()
        }
    }
}
