// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

// Environment inputs
pub const CREDENTIALS_PATH_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const PROJECT_NUMBER_ENV: &str = "GOOGLE_CLOUD_PROJECT_NUMBER";
pub const POOL_ID_ENV: &str = "GOOGLE_CLOUD_POOL_ID";
pub const PROVIDER_ID_ENV: &str = "GOOGLE_CLOUD_PROVIDER_ID";
pub const SERVICE_ACCOUNT_EMAIL_ENV: &str = "GOOGLE_CLOUD_SERVICE_ACCOUNT_EMAIL";
pub const AWS_REGION_ENV: &str = "AWS_REGION";
pub const AWS_DEFAULT_REGION_ENV: &str = "AWS_DEFAULT_REGION";

pub const WORKLOAD_IDENTITY_ENVS: [&str; 4] = [
    PROJECT_NUMBER_ENV,
    POOL_ID_ENV,
    PROVIDER_ID_ENV,
    SERVICE_ACCOUNT_EMAIL_ENV,
];

pub const DEFAULT_REGION: &str = "us-east-1";

pub const CACHE_LIFETIME: Duration = Duration::from_secs(4 * 60);
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

// Credential configuration
pub const EXTERNAL_ACCOUNT_TYPE: &str = "external_account";
pub const SUBJECT_TOKEN_TYPE_AWS: &str = "urn:ietf:params:aws:token-type:aws4_request";
pub const TOKEN_URL: &str = "https://sts.googleapis.com/v1/token";
pub const DEFAULT_ENVIRONMENT_ID: &str = "aws1";
/// `{region}` is substituted by the federation client, not by us.
pub const REGIONAL_CRED_VERIFICATION_URL: &str =
    "https://sts.{region}.amazonaws.com?Action=GetCallerIdentity&Version=2011-06-15";

// Remote locators
pub const ARN_PREFIX: &str = "arn:";
pub const SSM_SERVICE: &str = "ssm";
pub const SSM_PARAMETER_SEGMENT: &str = "parameter";

// Metadata proxy
pub const PROXY_BIND_ADDRESS: &str = "127.0.0.1:0";
pub const PROXY_HOST: &str = "127.0.0.1";
pub const REGION_PATH: &str = "/latest/meta-data/placement/availability-zone";
pub const CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials";
pub const CREDENTIALS_PROFILE: &str = "default";
pub const CREDENTIALS_DETAIL_PATH: &str = "/latest/meta-data/iam/security-credentials/default";
pub const METADATA_CREDENTIAL_TYPE: &str = "AWS-HMAC";
