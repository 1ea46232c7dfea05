// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use credential_broker::configuration::BrokerOptions;
use credential_broker::{Broker, BrokerConfig, CredentialInputs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        .with_target(false)
        // stdout carries the credential configuration
        .with_writer(std::io::stderr)
        .init();

    let options = BrokerOptions::parse();
    let serve = options.serve;

    tracing::debug!("[broker] {:?}", &options);

    let broker = Broker::new(BrokerConfig::default());
    let inputs = CredentialInputs::from(options);

    let option = broker
        .resolve(&inputs)
        .await
        .context("failed to resolve credentials")?;

    tracing::info!("[broker] resolved {} credentials", option.credential_type);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&option.json)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    drop(stdout);

    match broker.proxy_address().await {
        Some(address) if serve => {
            tracing::info!(
                "[broker] serving metadata at http://{} until interrupted",
                address
            );
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
        }
        Some(_) => tracing::warn!("[broker] metadata proxy stops on exit, pass --serve to keep it"),
        None => {}
    }

    broker.shutdown().await.context("failed to shut down")?;

    Ok(())
}
