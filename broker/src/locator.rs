// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Remote resource locators.
//!
//! A credentials path starting with `arn:` names a remote resource instead of a
//! local file:
//!
//! ```text
//! arn:<partition>:<service>:<region>:<account-id>:<resource>
//! arn:aws:ssm:us-east-1:123456789012:parameter/google/credentials
//! ```

use std::fmt;
use std::str::FromStr;

use crate::constants::{ARN_PREFIX, SSM_PARAMETER_SEGMENT};
use crate::errors::BrokerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

/// Returns true if `path` should be treated as a remote locator.
pub fn is_remote(path: &str) -> bool {
    path.starts_with(ARN_PREFIX)
}

impl FromStr for ResourceLocator {
    type Err = BrokerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| BrokerError::InvalidLocator {
            locator: raw.to_string(),
            reason: reason.to_string(),
        };

        // The resource section may itself contain colons.
        let sections: Vec<&str> = raw.splitn(6, ':').collect();
        let [prefix, partition, service, region, account_id, resource] = sections[..] else {
            return Err(invalid("not enough sections"));
        };
        if prefix != "arn" {
            return Err(invalid("missing arn prefix"));
        }
        if partition.is_empty() {
            return Err(invalid("partition is empty"));
        }
        if service.is_empty() {
            return Err(invalid("service is empty"));
        }

        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
        })
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

impl ResourceLocator {
    /// Derives the parameter store name from the resource section.
    ///
    /// `parameter/name` yields `name`; `parameter/a/b` yields the
    /// hierarchical name `/a/b`.
    pub fn parameter_name(&self) -> Result<String, BrokerError> {
        let mut segments: Vec<&str> = self.resource.split('/').collect();
        if segments.len() > 1 && segments[0] == SSM_PARAMETER_SEGMENT {
            segments.remove(0);
        }

        let name = match segments.as_slice() {
            [] | [""] => {
                return Err(BrokerError::InvalidLocator {
                    locator: self.to_string(),
                    reason: "resource is empty".to_string(),
                });
            }
            [single] => single.to_string(),
            many => format!("/{}", many.join("/")),
        };

        Ok(name)
    }
}
