// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Credential Broker
//!
//! Google Cloud credentials for workloads running on AWS, outside EC2.
//!
//! Google's workload identity federation for AWS reads the caller's region and
//! temporary credentials from the EC2 instance metadata service (IMDS). Lambda,
//! ECS and on-premises hosts have no IMDS, so this crate resolves the Google
//! credential configuration and, when it uses the AWS flow, serves the needed
//! slice of IMDS from a local proxy backed by the AWS default credential chain.
//!
//! ## Architecture
//!
//! ```text
//! Caller -> Broker -> cache
//!             |
//!             +-> SSM parameter / local file / workload identity env vars
//!             +-> rewrite credential_source -> metadata proxy (127.0.0.1:<port>)
//!                                                  |
//!             Google auth library  ---- polls ---->+-> AWS default credentials
//! ```
//!
//! ## Modules
//!
//! - [`broker`]: resolution, rewriting, caching and proxy lifecycle
//! - [`cache`]: single-slot TTL cache of the resolved configuration
//! - [`configuration`]: broker settings, environment inputs and CLI options
//! - [`constants`]: fixed paths, URLs, environment variable names and timeouts
//! - [`errors`]: error taxonomy with HTTP response mapping
//! - [`locator`]: `arn:` resource locator parsing
//! - [`models`]: credential configuration schema and metadata documents
//! - [`parameters`]: SSM parameter fetching
//! - [`parsing`]: base64/JSON decoding and validation
//! - [`proxy`]: the metadata proxy server
//! - [`resolver`]: credential source selection and workload identity synthesis
//!
//! ## Usage
//!
//! ```ignore
//! let broker = Broker::new(BrokerConfig::default());
//! let option = broker.get_credential_option().await?;
//! // hand option.json to the Google client library
//! broker.shutdown().await?;
//! ```
//!
//! ## Security Considerations
//!
//! - The proxy binds loopback only, on an OS-assigned port
//! - Temporary AWS credentials are zeroized on drop and redacted in `Debug`
//! - Credentials are fetched per request and never cached by the broker

pub mod broker;
pub mod cache;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod locator;
pub mod models;
pub mod parameters;
pub mod parsing;
pub mod proxy;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use broker::Broker;
pub use configuration::{BrokerConfig, CredentialInputs};
pub use errors::BrokerError;
pub use models::{CredentialConfig, CredentialOption, CredentialType};
pub use parameters::ParameterStore;
