// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use aws_credential_types::provider::SharedCredentialsProvider;
use clap::{ArgAction, Parser};

use crate::constants::{
    AWS_DEFAULT_REGION_ENV, AWS_REGION_ENV, CACHE_LIFETIME, CREDENTIALS_PATH_ENV,
    DEFAULT_REGION, POOL_ID_ENV, PROJECT_NUMBER_ENV, PROVIDER_ID_ENV, SERVICE_ACCOUNT_EMAIL_ENV,
    SHUTDOWN_TIMEOUT,
};
use crate::parameters::ParameterStore;

/// Construction-time settings and collaborators for a [`crate::broker::Broker`].
#[derive(Clone)]
pub struct BrokerConfig {
    pub cache_lifetime: Duration,
    pub shutdown_timeout: Duration,
    /// Defaults to an SSM client built from the AWS default configuration.
    pub parameter_store: Option<Arc<dyn ParameterStore>>,
    /// Defaults to the AWS default credential chain.
    pub credentials_provider: Option<SharedCredentialsProvider>,
    /// Defaults to the global subscriber.
    pub dispatch: Option<tracing::Dispatch>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            cache_lifetime: CACHE_LIFETIME,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
            parameter_store: None,
            credentials_provider: None,
            dispatch: None,
        }
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("cache_lifetime", &self.cache_lifetime)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("parameter_store", &self.parameter_store.is_some())
            .field("credentials_provider", &self.credentials_provider.is_some())
            .field("dispatch", &self.dispatch.is_some())
            .finish()
    }
}

/// Environment inputs consulted on every resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialInputs {
    /// Local file path or `arn:` locator.
    pub credentials_path: Option<String>,
    pub project_number: Option<String>,
    pub pool_id: Option<String>,
    pub provider_id: Option<String>,
    pub service_account_email: Option<String>,
    pub aws_region: Option<String>,
    pub aws_default_region: Option<String>,
}

impl CredentialInputs {
    pub fn from_env() -> Self {
        Self {
            credentials_path: env_var(CREDENTIALS_PATH_ENV),
            project_number: env_var(PROJECT_NUMBER_ENV),
            pool_id: env_var(POOL_ID_ENV),
            provider_id: env_var(PROVIDER_ID_ENV),
            service_account_email: env_var(SERVICE_ACCOUNT_EMAIL_ENV),
            aws_region: env_var(AWS_REGION_ENV),
            aws_default_region: env_var(AWS_DEFAULT_REGION_ENV),
        }
    }

    /// Region answered by the metadata proxy.
    pub fn region(&self) -> String {
        non_empty(&self.aws_region)
            .or_else(|| non_empty(&self.aws_default_region))
            .unwrap_or(DEFAULT_REGION)
            .to_string()
    }
}

/// Treats unset and empty values the same.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct BrokerOptions {
    /// Credential configuration file or SSM parameter ARN
    #[arg(long, env(CREDENTIALS_PATH_ENV))]
    pub credentials: Option<String>,
    #[arg(long, env(PROJECT_NUMBER_ENV))]
    pub project_number: Option<String>,
    #[arg(long, env(POOL_ID_ENV))]
    pub pool_id: Option<String>,
    #[arg(long, env(PROVIDER_ID_ENV))]
    pub provider_id: Option<String>,
    #[arg(long, env(SERVICE_ACCOUNT_EMAIL_ENV))]
    pub service_account_email: Option<String>,
    #[arg(long, env(AWS_REGION_ENV))]
    pub region: Option<String>,
    #[arg(long, env(AWS_DEFAULT_REGION_ENV))]
    pub default_region: Option<String>,
    /// Keep the metadata proxy running until interrupted
    #[arg(long, default_value = "false", env("BROKER_SERVE"), action = ArgAction::SetTrue)]
    pub serve: bool,
}

impl From<BrokerOptions> for CredentialInputs {
    fn from(options: BrokerOptions) -> Self {
        Self {
            credentials_path: options.credentials,
            project_number: options.project_number,
            pool_id: options.pool_id,
            provider_id: options.provider_id,
            service_account_email: options.service_account_email,
            aws_region: options.region,
            aws_default_region: options.default_region,
        }
    }
}
