// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use tokio::time::Instant;

use crate::models::{CredentialConfig, CredentialOption};

struct CachedCredential {
    json: Vec<u8>,
    config: CredentialConfig,
    expires_at: Instant,
}

/// Single-slot cache of the last resolved credential configuration.
///
/// The broker guards this behind its state lock, so no interior locking here.
pub struct CredentialCache {
    lifetime: Duration,
    cached: Option<CachedCredential>,
}

impl CredentialCache {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            cached: None,
        }
    }

    /// Returns the cached option if it has not expired yet.
    pub fn get(&self) -> Option<CredentialOption> {
        let cached = self.cached.as_ref()?;
        if Instant::now() >= cached.expires_at {
            return None;
        }
        Some(CredentialOption::new(cached.json.clone(), cached.config.clone()))
    }

    pub fn set(&mut self, json: Vec<u8>, config: CredentialConfig) {
        let expires_at = Instant::now() + self.lifetime;
        tracing::trace!("[broker] caching credentials for {:?}", self.lifetime);
        self.cached = Some(CachedCredential {
            json,
            config,
            expires_at,
        });
    }

    pub fn clear(&mut self) {
        self.cached = None;
    }
}
