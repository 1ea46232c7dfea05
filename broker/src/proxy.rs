// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Local stand-in for the EC2 instance metadata service.
//!
//! Google's external account flow for AWS reads the region and temporary
//! credentials from IMDS. Outside EC2 there is no IMDS, so the broker serves
//! the subset the flow needs on an ephemeral loopback port:
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/latest/meta-data/placement/availability-zone` | [`region`] | Configured AWS region |
//! | GET | `/latest/meta-data/iam/security-credentials` | [`credentials_list`] | Profile name (`default`) |
//! | GET | `/latest/meta-data/iam/security-credentials/default` | [`credentials_detail`] | Temporary credentials |

use std::net::SocketAddr;
use std::sync::Weak;
use std::time::Duration;

use aws_credential_types::provider::ProvideCredentials;
use axum::Json;
use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;

use crate::broker::BrokerState;
use crate::constants::{
    CREDENTIALS_DETAIL_PATH, CREDENTIALS_PATH, CREDENTIALS_PROFILE, PROXY_BIND_ADDRESS,
    REGION_PATH,
};
use crate::errors::{BrokerError, error_chain};
use crate::models::MetadataCredentials;

/// Shared with every request handler.
///
/// The broker state is held weakly so a running server never keeps a dropped
/// broker alive.
#[derive(Clone)]
pub struct ProxyContext {
    pub(crate) state: Weak<Mutex<BrokerState>>,
    pub(crate) region: String,
    pub(crate) dispatch: Option<tracing::Dispatch>,
}

/// A running metadata proxy.
pub struct ProxyServer {
    address: SocketAddr,
    region: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ProxyServer {
    /// Binds an ephemeral loopback port and starts serving in the background.
    pub(crate) async fn start(context: ProxyContext) -> Result<Self, BrokerError> {
        let listener = TcpListener::bind(PROXY_BIND_ADDRESS)
            .await
            .map_err(BrokerError::ProxyStartFailed)?;
        let address = listener
            .local_addr()
            .map_err(BrokerError::ProxyStartFailed)?;

        let region = context.region.clone();
        let dispatch = context.dispatch.clone();
        let app = create_router(context);
        let (shutdown, signal) = oneshot::channel::<()>();

        let serve = async move {
            tracing::info!("[broker] metadata proxy listening at http://{}", address);
            let server = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                // A dropped sender also stops the server.
                let _ = signal.await;
            });
            if let Err(err) = server.await {
                tracing::error!("[broker] metadata proxy failed: {:?}", err);
            }
            tracing::info!("[broker] metadata proxy at {} stopped", address);
        };
        let handle = match dispatch {
            Some(dispatch) => tokio::spawn(serve.with_subscriber(dispatch)),
            None => tokio::spawn(serve),
        };

        Ok(Self {
            address,
            region,
            shutdown,
            handle,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Stops accepting connections and waits for in-flight requests to finish.
    ///
    /// On timeout the serve task is aborted, which releases the socket.
    pub(crate) async fn stop(self, timeout: Duration) -> Result<(), BrokerError> {
        let Self {
            address,
            shutdown,
            mut handle,
            ..
        } = self;

        let _ = shutdown.send(());

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => {
                tracing::debug!("[broker] metadata proxy at {} drained", address);
                Ok(())
            }
            Ok(Err(err)) => Err(BrokerError::ProxyShutdownFailed(format!(
                "serve task for {address} failed: {err}"
            ))),
            Err(_) => {
                handle.abort();
                Err(BrokerError::ProxyShutdownFailed(format!(
                    "timed out after {timeout:?} waiting for {address} to drain"
                )))
            }
        }
    }
}

pub fn create_router(context: ProxyContext) -> Router {
    Router::new()
        .route(REGION_PATH, get(region))
        .route(CREDENTIALS_PATH, get(credentials_list))
        .route(CREDENTIALS_DETAIL_PATH, get(credentials_detail))
        .layer(middleware::from_fn_with_state(context.clone(), log_request))
        .with_state(context)
}

async fn log_request(
    State(context): State<ProxyContext>,
    request: Request,
    next: Next,
) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    // Owned captures only: the request body is not Sync.
    let log = move || {
        tracing::debug!(
            method = %method,
            path = %path,
            remote_addr = %remote_addr,
            "[broker] received request on metadata proxy"
        )
    };

    match context.dispatch {
        Some(dispatch) => {
            tracing::dispatcher::with_default(&dispatch, log);
            next.run(request).with_subscriber(dispatch).await
        }
        None => {
            log();
            next.run(request).await
        }
    }
}

/// Returns the region the proxy was started with.
pub async fn region(State(context): State<ProxyContext>) -> String {
    context.region
}

/// Lists the single credential profile served by the proxy.
pub async fn credentials_list() -> &'static str {
    CREDENTIALS_PROFILE
}

/// Returns fresh temporary credentials from the underlying provider.
///
/// The broker lock is held for the whole lookup since the memoized AWS
/// configuration lives behind it. Requests for credentials are therefore
/// serialized.
///
/// # Errors
///
/// - [`BrokerError::UnderlyingCredentialFailed`] - rendered as HTTP 500 with
///   `{"Code": "Failed", "Message": "..."}`
#[tracing::instrument(skip(context), fields(region = %context.region))]
pub async fn credentials_detail(
    State(context): State<ProxyContext>,
) -> Result<Json<MetadataCredentials>, BrokerError> {
    let shared = context.state.upgrade().ok_or_else(|| {
        BrokerError::UnderlyingCredentialFailed("credential broker is gone".to_string())
    })?;
    let mut state = shared.lock().await;

    let provider = state
        .credentials_provider(&context.region)
        .await
        .map_err(|err| BrokerError::UnderlyingCredentialFailed(error_chain(&err)))?;
    let credentials = provider
        .provide_credentials()
        .await
        .map_err(|err| BrokerError::UnderlyingCredentialFailed(error_chain(&err)))?;

    tracing::debug!("[broker] serving credentials expiring at {:?}", credentials.expiry());

    Ok(Json(MetadataCredentials::success(
        &credentials.into(),
        Utc::now(),
    )))
}
