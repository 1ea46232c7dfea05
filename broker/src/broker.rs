// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! The credential broker.
//!
//! A [`Broker`] resolves a Google credential configuration, rewrites AWS
//! workload identity federation configurations to read from the local
//! [metadata proxy](crate::proxy), and caches the result.
//!
//! # Resolution Flow
//!
//! 1. Return the cached configuration if it has not expired
//! 2. Classify the inputs (see [`crate::resolver`]) and load raw bytes from an
//!    SSM parameter, a local file, or a synthesized workload identity config
//! 3. Parse the bytes (base64 or plain JSON)
//! 4. For AWS external account configurations without a `file` source, start
//!    the metadata proxy (once) and point the credential source at it
//! 5. Cache and return
//!
//! # Locking
//!
//! All mutable state lives behind one [`tokio::sync::Mutex`]. It is held for
//! short critical sections only, except in the proxy's credentials handler,
//! which keeps it while the underlying AWS provider runs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use axum::Router;
use tokio::sync::Mutex;
use tracing::instrument::WithSubscriber;

use crate::cache::CredentialCache;
use crate::configuration::{BrokerConfig, CredentialInputs};
use crate::constants::{
    CREDENTIALS_PATH, DEFAULT_ENVIRONMENT_ID, PROXY_HOST, REGION_PATH,
    REGIONAL_CRED_VERIFICATION_URL, SUBJECT_TOKEN_TYPE_AWS,
};
use crate::errors::BrokerError;
use crate::models::{CredentialConfig, CredentialOption};
use crate::parameters::{self, ParameterStore};
use crate::parsing::parse_credentials;
use crate::proxy::{self, ProxyContext, ProxyServer};
use crate::resolver::{self, ConfigOrigin};

pub(crate) struct BrokerState {
    cache: CredentialCache,
    proxy: Option<ProxyServer>,
    sdk_config: Option<SdkConfig>,
    parameter_store: Option<Arc<dyn ParameterStore>>,
    credentials_provider: Option<SharedCredentialsProvider>,
    dispatch: Option<tracing::Dispatch>,
}

impl BrokerState {
    /// Loads the AWS default configuration once.
    async fn sdk_config(&mut self) -> &SdkConfig {
        let config = match self.sdk_config.take() {
            Some(config) => config,
            None => {
                tracing::debug!("[broker] loading default aws configuration");
                aws_config::load_defaults(BehaviorVersion::latest()).await
            }
        };
        self.sdk_config.insert(config)
    }

    async fn parameter_store(&mut self) -> Arc<dyn ParameterStore> {
        if let Some(store) = &self.parameter_store {
            return store.clone();
        }
        let store: Arc<dyn ParameterStore> =
            Arc::new(aws_sdk_ssm::Client::new(self.sdk_config().await));
        self.parameter_store = Some(store.clone());
        store
    }

    /// Provider of the long-lived credentials served by the proxy, scoped to
    /// `region`.
    pub(crate) async fn credentials_provider(
        &mut self,
        region: &str,
    ) -> Result<SharedCredentialsProvider, BrokerError> {
        if let Some(provider) = &self.credentials_provider {
            return Ok(provider.clone());
        }
        self.sdk_config()
            .await
            .to_builder()
            .region(Region::new(region.to_string()))
            .build()
            .credentials_provider()
            .ok_or_else(|| {
                BrokerError::AwsConfig("no credentials provider configured".to_string())
            })
    }
}

/// Resolves and caches Google credential configurations, serving AWS
/// credentials to the federation flow from a local metadata proxy.
///
/// Cloning a broker is cheap and every clone shares the same cache and proxy.
/// The proxy stops when [`shutdown`](Broker::shutdown) is called or the last
/// clone is dropped.
#[derive(Clone)]
pub struct Broker {
    state: Arc<Mutex<BrokerState>>,
    shutdown_timeout: Duration,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Self {
        let state = BrokerState {
            cache: CredentialCache::new(config.cache_lifetime),
            proxy: None,
            sdk_config: None,
            parameter_store: config.parameter_store,
            credentials_provider: config.credentials_provider,
            dispatch: config.dispatch,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    /// Replaces the parameter store used by later resolutions.
    pub async fn set_parameter_store(&self, store: Arc<dyn ParameterStore>) {
        self.state.lock().await.parameter_store = Some(store);
    }

    /// Replaces the provider behind the proxy's credentials endpoint.
    pub async fn set_credentials_provider(&self, provider: SharedCredentialsProvider) {
        self.state.lock().await.credentials_provider = Some(provider);
    }

    /// Routes later resolutions' logs to `dispatch`.
    pub async fn set_logger(&self, dispatch: tracing::Dispatch) {
        self.state.lock().await.dispatch = Some(dispatch);
    }

    /// Address of the metadata proxy, if it has been started.
    pub async fn proxy_address(&self) -> Option<SocketAddr> {
        self.state
            .lock()
            .await
            .proxy
            .as_ref()
            .map(ProxyServer::address)
    }

    /// Region answered by the metadata proxy, if it has been started.
    pub async fn proxy_region(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .proxy
            .as_ref()
            .map(|proxy| proxy.region().to_string())
    }

    /// Metadata routes bound to this broker, for mounting in another server.
    pub async fn metadata_router(&self, region: impl Into<String>) -> Router {
        proxy::create_router(self.proxy_context(region).await)
    }

    pub(crate) async fn proxy_context(&self, region: impl Into<String>) -> ProxyContext {
        ProxyContext {
            state: Arc::downgrade(&self.state),
            region: region.into(),
            dispatch: self.state.lock().await.dispatch.clone(),
        }
    }

    /// Resolves a credential configuration from the process environment.
    pub async fn get_credential_option(&self) -> Result<CredentialOption, BrokerError> {
        self.resolve(&CredentialInputs::from_env()).await
    }

    /// Resolves a credential configuration from explicit inputs.
    pub async fn resolve(&self, inputs: &CredentialInputs) -> Result<CredentialOption, BrokerError> {
        let dispatch = self.state.lock().await.dispatch.clone();
        match dispatch {
            Some(dispatch) => self.resolve_inputs(inputs).with_subscriber(dispatch).await,
            None => self.resolve_inputs(inputs).await,
        }
    }

    /// Parses, rewrites and caches an inline configuration.
    pub async fn resolve_bytes(&self, raw: &[u8]) -> Result<CredentialOption, BrokerError> {
        let region = CredentialInputs::from_env().region();
        let dispatch = self.state.lock().await.dispatch.clone();
        match dispatch {
            Some(dispatch) => self.resolve_raw(raw, region).with_subscriber(dispatch).await,
            None => self.resolve_raw(raw, region).await,
        }
    }

    /// Stops the metadata proxy and clears the cache.
    ///
    /// A no-op when the proxy is not running, so calling it twice is safe.
    /// The proxy is detached from the broker before draining so in-flight
    /// credential requests can still take the lock and finish.
    pub async fn shutdown(&self) -> Result<(), BrokerError> {
        let Some(proxy) = self.state.lock().await.proxy.take() else {
            return Ok(());
        };

        tracing::info!("[broker] shutting down metadata proxy at {}", proxy.address());
        let result = proxy.stop(self.shutdown_timeout).await;

        // Cached configurations point at the stopped proxy.
        self.state.lock().await.cache.clear();

        result
    }

    #[tracing::instrument(skip_all)]
    async fn resolve_inputs(
        &self,
        inputs: &CredentialInputs,
    ) -> Result<CredentialOption, BrokerError> {
        if let Some(option) = self.state.lock().await.cache.get() {
            tracing::debug!("[broker] use cached credentials");
            return Ok(option);
        }

        let region = inputs.region();
        match resolver::classify(inputs)? {
            ConfigOrigin::Remote(locator) => {
                parameters::ensure_supported(&locator)?;
                let store = self.state.lock().await.parameter_store().await;
                let raw = parameters::fetch(store.as_ref(), &locator).await?;
                self.resolve_raw(&raw, region).await
            }
            ConfigOrigin::File(path) => {
                tracing::debug!("[broker] reading credentials from {}", path.display());
                let raw = tokio::fs::read(&path)
                    .await
                    .map_err(|source| BrokerError::CredentialFileUnreadable { path, source })?;
                self.resolve_raw(&raw, region).await
            }
            ConfigOrigin::WorkloadIdentity(identity) => {
                tracing::debug!(
                    "[broker] synthesizing workload identity credentials for pool {} provider {}",
                    identity.pool_id,
                    identity.provider_id
                );
                let raw =
                    serde_json::to_vec(&identity.to_config()).map_err(BrokerError::Serialization)?;
                self.resolve_raw(&raw, region).await
            }
        }
    }

    async fn resolve_raw(&self, raw: &[u8], region: String) -> Result<CredentialOption, BrokerError> {
        let (json, mut config) = parse_credentials(raw)?;

        // Non-temporary credentials are handed out byte for byte.
        if !config.is_temporary() {
            self.store(json.clone(), config.clone(), None).await;
            return Ok(CredentialOption::new(json, config));
        }

        let proxy = self.rewrite_credential_source(&mut config, region).await?;
        let json = serde_json::to_vec(&config).map_err(BrokerError::Serialization)?;
        self.store(json.clone(), config.clone(), proxy).await;

        Ok(CredentialOption::new(json, config))
    }

    /// Caches a resolution unless the proxy it points at has been shut down
    /// since the rewrite.
    async fn store(&self, json: Vec<u8>, config: CredentialConfig, proxy: Option<SocketAddr>) {
        let mut state = self.state.lock().await;
        if proxy.is_some() && proxy != state.proxy.as_ref().map(ProxyServer::address) {
            tracing::debug!("[broker] metadata proxy stopped during resolution, not caching");
            return;
        }
        state.cache.set(json, config);
    }

    /// Points an AWS external account configuration at the metadata proxy and
    /// returns the proxy address it now uses.
    ///
    /// Configurations for other subject token types, or with a `file`
    /// credential source, are left untouched.
    async fn rewrite_credential_source(
        &self,
        config: &mut CredentialConfig,
        region: String,
    ) -> Result<Option<SocketAddr>, BrokerError> {
        if config.subject_token_type != SUBJECT_TOKEN_TYPE_AWS || config.has_file_source() {
            return Ok(None);
        }

        let address = self.ensure_proxy(region).await?;
        let base = format!("http://{}:{}", PROXY_HOST, address.port());

        let source = config.credential_source.get_or_insert_with(Default::default);
        if source.environment_id.is_empty() {
            source.environment_id = DEFAULT_ENVIRONMENT_ID.to_string();
        }
        source.url = format!("{base}{CREDENTIALS_PATH}");
        source.region_url = format!("{base}{REGION_PATH}");
        source.regional_cred_verification_url = REGIONAL_CRED_VERIFICATION_URL.to_string();

        Ok(Some(address))
    }

    /// Starts the proxy unless it is already running.
    ///
    /// Check and start happen under the state lock, so concurrent callers
    /// never bind a second listener.
    async fn ensure_proxy(&self, region: String) -> Result<SocketAddr, BrokerError> {
        let mut state = self.state.lock().await;
        if let Some(proxy) = &state.proxy {
            return Ok(proxy.address());
        }

        let context = ProxyContext {
            state: Arc::downgrade(&self.state),
            region,
            dispatch: state.dispatch.clone(),
        };
        let proxy = ProxyServer::start(context).await?;
        let address = proxy.address();
        state.proxy = Some(proxy);

        Ok(address)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::errors::BoxError;
    use crate::models::CredentialType;
    use crate::test_support::CapturedLogs;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SSM_ARN: &str = "arn:aws:ssm:us-east-1:123456789012:parameter/test-parameter";

    const SERVICE_ACCOUNT: &str =
        r#"{"type":"service_account","project_id":"demo","private_key_id":"abc"}"#;

    const EXTERNAL_ACCOUNT: &str = r#"{"type":"external_account","audience":"//iam.googleapis.com/projects/123/locations/global/workloadIdentityPools/pool/providers/provider","subject_token_type":"urn:ietf:params:aws:token-type:aws4_request","service_account_impersonation_url":"https://iamcredentials.googleapis.com/v1/projects/-/serviceAccounts/service-account-email:generateAccessToken","token_url":"https://sts.googleapis.com/v1/token"}"#;

    struct CountingStore {
        value: String,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(value: &str) -> Arc<Self> {
            Arc::new(Self {
                value: value.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ParameterStore for CountingStore {
        async fn fetch_parameter(&self, name: &str) -> Result<Vec<u8>, BoxError> {
            assert_eq!(name, "test-parameter");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value.as_bytes().to_vec())
        }
    }

    fn ssm_inputs() -> CredentialInputs {
        CredentialInputs {
            credentials_path: Some(SSM_ARN.to_string()),
            ..Default::default()
        }
    }

    fn broker_with(store: Arc<CountingStore>, cache_lifetime: Duration) -> Broker {
        Broker::new(BrokerConfig {
            cache_lifetime,
            parameter_store: Some(store as Arc<dyn ParameterStore>),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_non_temporary_credentials_are_unchanged() {
        let store = CountingStore::new(SERVICE_ACCOUNT);
        let broker = broker_with(store.clone(), Duration::from_secs(60));

        let option = broker.resolve(&ssm_inputs()).await.unwrap();
        assert_eq!(option.credential_type, CredentialType::ServiceAccount);
        assert_eq!(option.json, SERVICE_ACCOUNT.as_bytes());
        assert!(broker.proxy_address().await.is_none());
    }

    #[tokio::test]
    async fn test_external_account_points_at_proxy() {
        let store = CountingStore::new(EXTERNAL_ACCOUNT);
        let broker = broker_with(store, Duration::from_secs(60));

        let option = broker.resolve(&ssm_inputs()).await.unwrap();
        let address = broker.proxy_address().await.unwrap();
        let source = option.config.credential_source.as_ref().unwrap();

        assert_eq!(option.credential_type, CredentialType::ExternalAccount);
        assert_eq!(source.environment_id, "aws1");
        assert_eq!(
            source.url,
            format!(
                "http://127.0.0.1:{}/latest/meta-data/iam/security-credentials",
                address.port()
            )
        );
        assert_eq!(
            source.region_url,
            format!(
                "http://127.0.0.1:{}/latest/meta-data/placement/availability-zone",
                address.port()
            )
        );
        assert_eq!(
            source.regional_cred_verification_url,
            "https://sts.{region}.amazonaws.com?Action=GetCallerIdentity&Version=2011-06-15"
        );

        let json: serde_json::Value = serde_json::from_slice(&option.json).unwrap();
        assert_eq!(json["credential_source"]["url"], source.url.as_str());
        assert_eq!(json["audience"], option.config.audience.as_str());

        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_existing_environment_id_is_kept() {
        let raw = r#"{"type":"external_account","subject_token_type":"urn:ietf:params:aws:token-type:aws4_request","credential_source":{"environment_id":"aws2"}}"#;
        let broker = broker_with(CountingStore::new(raw), Duration::from_secs(60));

        let option = broker.resolve(&ssm_inputs()).await.unwrap();
        let source = option.config.credential_source.unwrap();
        assert_eq!(source.environment_id, "aws2");
        assert!(source.url.starts_with("http://127.0.0.1:"));

        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_source_is_never_overwritten() {
        let raw = r#"{"type":"external_account","subject_token_type":"urn:ietf:params:aws:token-type:aws4_request","credential_source":{"file":"/var/run/token"}}"#;
        let broker = broker_with(CountingStore::new(raw), Duration::from_secs(60));

        let option = broker.resolve(&ssm_inputs()).await.unwrap();
        let source = option.config.credential_source.unwrap();
        assert_eq!(source.file, "/var/run/token");
        assert!(source.url.is_empty());
        assert!(source.region_url.is_empty());
        assert!(broker.proxy_address().await.is_none());
    }

    #[tokio::test]
    async fn test_other_subject_token_types_pass_through() {
        let raw = r#"{"type":"external_account","subject_token_type":"urn:ietf:params:oauth:token-type:jwt","credential_source":{"url":"http://169.254.169.254/token"}}"#;
        let broker = broker_with(CountingStore::new(raw), Duration::from_secs(60));

        let option = broker.resolve(&ssm_inputs()).await.unwrap();
        let source = option.config.credential_source.unwrap();
        assert_eq!(source.url, "http://169.254.169.254/token");
        assert!(broker.proxy_address().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_limits_remote_fetches() {
        let store = CountingStore::new(SERVICE_ACCOUNT);
        let broker = broker_with(store.clone(), Duration::from_secs(240));

        let first = broker.resolve(&ssm_inputs()).await.unwrap();
        tokio::time::advance(Duration::from_secs(200)).await;
        let second = broker.resolve(&ssm_inputs()).await.unwrap();
        assert_eq!(store.calls(), 1);
        assert_eq!(first, second);

        tokio::time::advance(Duration::from_secs(40)).await;
        broker.resolve(&ssm_inputs()).await.unwrap();
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_source_classification() {
        let store = CountingStore::new(SERVICE_ACCOUNT);
        let broker = broker_with(store, Duration::from_secs(60));
        broker.resolve(&ssm_inputs()).await.unwrap();

        // Nothing configured, but the cached entry is still served.
        let option = broker.resolve(&CredentialInputs::default()).await.unwrap();
        assert_eq!(option.json, SERVICE_ACCOUNT.as_bytes());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rewrites_start_one_proxy() {
        let store = CountingStore::new(EXTERNAL_ACCOUNT);
        // A zero lifetime forces every call through the rewriter.
        let broker = broker_with(store.clone(), Duration::ZERO);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let broker = broker.clone();
                tokio::spawn(async move { broker.resolve(&ssm_inputs()).await })
            })
            .collect();

        let mut urls = Vec::new();
        for task in tasks {
            let option = task.await.unwrap().unwrap();
            urls.push(option.config.credential_source.unwrap().url);
        }

        assert_eq!(store.calls(), 16);
        assert!(urls.iter().all(|url| *url == urls[0]));
        let address = broker.proxy_address().await.unwrap();
        assert!(urls[0].contains(&format!(":{}/", address.port())));

        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let broker = Broker::default();
        broker.shutdown().await.unwrap();

        let broker = broker_with(CountingStore::new(EXTERNAL_ACCOUNT), Duration::from_secs(60));
        broker.resolve(&ssm_inputs()).await.unwrap();
        assert!(broker.proxy_address().await.is_some());

        broker.shutdown().await.unwrap();
        broker.shutdown().await.unwrap();
        assert!(broker.proxy_address().await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_clears_cache() {
        let store = CountingStore::new(EXTERNAL_ACCOUNT);
        let broker = broker_with(store.clone(), Duration::from_secs(60));

        let before = broker.resolve(&ssm_inputs()).await.unwrap();
        broker.shutdown().await.unwrap();
        let after = broker.resolve(&ssm_inputs()).await.unwrap();

        assert_eq!(store.calls(), 2);
        assert!(before.config.credential_source.is_some());
        assert!(after.config.credential_source.is_some());
        assert!(broker.proxy_address().await.is_some());

        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_resolution_racing_shutdown_is_not_cached() {
        let store = CountingStore::new(EXTERNAL_ACCOUNT);
        let broker = broker_with(store.clone(), Duration::from_secs(60));
        let option = broker.resolve(&ssm_inputs()).await.unwrap();
        let stale = broker.proxy_address().await.unwrap();
        broker.shutdown().await.unwrap();

        // A resolution that rewrote against the stopped proxy finishes late.
        broker.store(option.json, option.config, Some(stale)).await;
        assert!(broker.state.lock().await.cache.get().is_none());

        broker.resolve(&ssm_inputs()).await.unwrap();
        assert_eq!(store.calls(), 2);
        let current = broker.proxy_address().await;
        assert!(current.is_some());

        // Against the running proxy the entry is kept.
        let option = broker.state.lock().await.cache.get().unwrap();
        broker.state.lock().await.cache.clear();
        broker.store(option.json, option.config, current).await;
        assert!(broker.state.lock().await.cache.get().is_some());

        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_workload_identity_resolution() {
        let broker = Broker::default();
        let inputs = CredentialInputs {
            project_number: Some("123".to_string()),
            pool_id: Some("pool".to_string()),
            provider_id: Some("prov".to_string()),
            service_account_email: Some("sa@x.iam.gserviceaccount.com".to_string()),
            ..Default::default()
        };

        let option = broker.resolve(&inputs).await.unwrap();
        assert_eq!(
            option.config.audience,
            "//iam.googleapis.com/projects/123/locations/global/workloadIdentityPools/pool/providers/prov"
        );
        assert!(option.config.credential_source.is_some());
        assert_eq!(broker.proxy_region().await.as_deref(), Some("us-east-1"));

        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_proxy_region_from_inputs() {
        let store = CountingStore::new(EXTERNAL_ACCOUNT);
        let broker = broker_with(store, Duration::from_secs(60));
        let inputs = CredentialInputs {
            aws_default_region: Some("eu-central-1".to_string()),
            ..ssm_inputs()
        };

        broker.resolve(&inputs).await.unwrap();
        assert_eq!(broker.proxy_region().await.as_deref(), Some("eu-central-1"));

        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_configuration() {
        let broker = Broker::default();
        let err = broker.resolve(&CredentialInputs::default()).await.unwrap_err();
        assert!(matches!(err, BrokerError::ConfigurationMissing { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_locator_service() {
        let store = CountingStore::new(SERVICE_ACCOUNT);
        let broker = broker_with(store.clone(), Duration::from_secs(60));
        let inputs = CredentialInputs {
            credentials_path: Some("arn:aws:secretsmanager:us-east-1:1:secret:creds".to_string()),
            ..Default::default()
        };

        let err = broker.resolve(&inputs).await.unwrap_err();
        assert!(matches!(err, BrokerError::UnsupportedSource { .. }));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_file() {
        let broker = Broker::default();
        let inputs = CredentialInputs {
            credentials_path: Some("/nonexistent/credentials.json".to_string()),
            ..Default::default()
        };

        let err = broker.resolve(&inputs).await.unwrap_err();
        assert!(matches!(err, BrokerError::CredentialFileUnreadable { .. }));
    }

    #[tokio::test]
    async fn test_resolve_inline_bytes() {
        let broker = Broker::default();
        let option = broker.resolve_bytes(SERVICE_ACCOUNT.as_bytes()).await.unwrap();
        assert_eq!(option.json, SERVICE_ACCOUNT.as_bytes());

        let err = broker.resolve_bytes(b"").await.unwrap_err();
        assert!(matches!(err, BrokerError::EmptyCredentials));
    }

    #[tokio::test]
    async fn test_set_logger_captures_resolution_logs() {
        let logs = CapturedLogs::default();

        let broker = broker_with(CountingStore::new(EXTERNAL_ACCOUNT), Duration::from_secs(60));
        broker.set_logger(logs.dispatch()).await;
        broker.resolve(&ssm_inputs()).await.unwrap();
        broker.resolve(&ssm_inputs()).await.unwrap();
        broker.shutdown().await.unwrap();

        let output = logs.contents();
        assert!(output.contains("[broker] use cached credentials"));
        assert!(output.contains("[broker] metadata proxy listening"));
    }

    #[tokio::test]
    async fn test_set_parameter_store_applies_to_later_resolutions() {
        let first = CountingStore::new(SERVICE_ACCOUNT);
        let broker = broker_with(first.clone(), Duration::ZERO);
        broker.resolve(&ssm_inputs()).await.unwrap();

        let second = CountingStore::new(SERVICE_ACCOUNT);
        broker.set_parameter_store(second.clone()).await;
        broker.resolve(&ssm_inputs()).await.unwrap();

        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }
}
