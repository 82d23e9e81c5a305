// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation

use crate::error::{HarnessError, Result};
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::{debug, instrument};

/// Create a client from the ambient configuration (in-cluster or kubeconfig),
/// optionally pinned to a named kubeconfig context.
#[instrument]
pub async fn connect(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(context) => {
            debug!("Using kubeconfig context {}", context);
            let options = KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            };
            KConfig::from_kubeconfig(&options).await.map_err(|e| {
                HarnessError::KubeconfigError(format!(
                    "Failed to load context {}: {}",
                    context, e
                ))
            })?
        }
        None => KConfig::infer()
            .await
            .map_err(|e| HarnessError::KubeconfigError(format!("Failed to infer config: {}", e)))?,
    };

    Client::try_from(config)
        .map_err(|e| HarnessError::KubeconfigError(format!("Failed to create client: {}", e)))
}
