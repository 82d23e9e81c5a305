// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-run namespace isolation.
//!
//! [`acquire`] creates a uniquely named namespace and hands back a
//! [`ScopeGuard`] that owns it. The guard must be released explicitly with
//! [`ScopeGuard::release`]; if it is dropped first (for example because the
//! run future was cancelled) it schedules the deletion on the current tokio
//! runtime instead.

use crate::chart::{release_prefix, ChartRef};
use crate::constants::{labels, naming};
use crate::error::{HarnessError, Result};
use crate::kubernetes::{ClusterClient, ClusterError};
use crate::types::Scope;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Generate a namespace name of the form `{prefix}-{random hex}`.
///
/// The prefix is truncated so the result fits in a DNS-1123 label.
pub fn generate_scope_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..naming::SUFFIX_LEN];

    let max_prefix = naming::MAX_NAMESPACE_LEN - naming::SUFFIX_LEN - 1;
    let prefix = match prefix.char_indices().nth(max_prefix) {
        Some((idx, _)) => &prefix[..idx],
        None => prefix,
    };
    let prefix = prefix.trim_end_matches('-');

    format!("{}-{}", prefix, suffix)
}

fn scope_labels(chart: &ChartRef) -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::MANAGED.to_string(), "true".to_string()),
        (labels::CHART.to_string(), release_prefix(chart)),
    ])
}

/// Create an isolated namespace for one run of `chart`
#[instrument(skip(cluster, chart), fields(chart = %chart.name()))]
pub async fn acquire<C>(cluster: Arc<C>, chart: &ChartRef) -> Result<ScopeGuard<C>>
where
    C: ClusterClient + 'static,
{
    let id = generate_scope_id(&release_prefix(chart));

    match cluster.create_namespace(&id, &scope_labels(chart)).await {
        Ok(()) => {
            info!(namespace = %id, "Acquired scope");
            Ok(ScopeGuard {
                cluster,
                scope: Scope::new(id),
            })
        }
        Err(ClusterError::Rejected(cause)) => Err(HarnessError::Provisioning(cause)),
        Err(e) => {
            // The create may have landed even though the response was lost
            if let Err(cleanup) = cluster.delete_namespace(&id).await {
                warn!(namespace = %id, "Failed to clean up after failed create: {}", cleanup);
            }
            Err(HarnessError::Provisioning(format!(
                "Failed to create namespace {}: {}",
                id, e
            )))
        }
    }
}

/// Owns a namespace created by [`acquire`] until it is released
pub struct ScopeGuard<C: ClusterClient + 'static> {
    cluster: Arc<C>,
    scope: Scope,
}

impl<C: ClusterClient + 'static> ScopeGuard<C> {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn id(&self) -> &str {
        &self.scope.id
    }

    /// Delete the namespace.
    ///
    /// Only the first call talks to the cluster; later calls return `Ok(())`.
    pub async fn release(&mut self) -> Result<()> {
        if self.scope.released {
            return Ok(());
        }
        self.scope.released = true;

        self.cluster
            .delete_namespace(&self.scope.id)
            .await
            .map_err(|e| {
                HarnessError::Provisioning(format!(
                    "Failed to delete namespace {}: {}",
                    self.scope.id, e
                ))
            })?;

        info!(namespace = %self.scope.id, "Released scope");
        Ok(())
    }
}

impl<C: ClusterClient + 'static> Drop for ScopeGuard<C> {
    fn drop(&mut self) {
        if self.scope.released {
            return;
        }

        let id = self.scope.id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(namespace = %id, "Scope dropped without release, deleting in background");
                let cluster = self.cluster.clone();
                handle.spawn(async move {
                    if let Err(e) = cluster.delete_namespace(&id).await {
                        warn!(namespace = %id, "Background namespace deletion failed: {}", e);
                    }
                });
            }
            Err(_) => warn!(namespace = %id, "Scope dropped outside a runtime, namespace leaked"),
        }
    }
}
