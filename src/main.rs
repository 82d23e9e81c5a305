// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use chartcheck::chart::{find_all_charts, ChartRef};
use chartcheck::config::{ChartSelection, Config};
use chartcheck::harness::{verify_all, VerificationHarness};
use chartcheck::installer::HelmInstaller;
use chartcheck::kubernetes::{connect, KubeCluster};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: timeout={:?} poll_interval={:?}",
        config.wait_policy.timeout, config.wait_policy.poll_interval
    );

    let charts = match &config.charts {
        ChartSelection::Single(path) => vec![ChartRef::load(path)?],
        ChartSelection::Discover { root, exclusions } => find_all_charts(root, exclusions)?,
    };
    if charts.is_empty() {
        warn!("No charts to verify");
        return Ok(ExitCode::SUCCESS);
    }
    info!("Verifying {} chart(s)", charts.len());

    let client = connect(config.kube_context.as_deref()).await?;
    info!("Connected to Kubernetes cluster");

    let installer =
        HelmInstaller::new(config.helm_binary.clone()).with_extra_args(config.helm_extra_args.clone());
    let harness = VerificationHarness::new(Arc::new(KubeCluster::new(client)), Arc::new(installer));

    // Ctrl-C aborts any pending waits; cleanup still runs
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling verification");
            on_signal.cancel();
        }
    });

    let results = verify_all(&harness, &charts, &config.wait_policy, &cancel).await;

    let mut failed = 0;
    for result in &results {
        println!("{}", serde_json::to_string_pretty(result)?);
        if result.succeeded() {
            info!(chart = %result.chart, "PASSED");
        } else {
            failed += 1;
            error!(
                chart = %result.chart,
                "FAILED: {}",
                result.reason.as_deref().unwrap_or("unknown reason")
            );
        }
    }

    if failed > 0 {
        error!("{} of {} chart(s) failed verification", failed, results.len());
        Ok(ExitCode::FAILURE)
    } else {
        info!("All {} chart(s) verified", results.len());
        Ok(ExitCode::SUCCESS)
    }
}
