// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded readiness polling for a deployed workload.

use crate::error::{HarnessError, Result};
use crate::kubernetes::{ClusterClient, ClusterError};
use crate::types::{WaitPolicy, WorkloadHandle};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Poll a workload at a fixed interval until its available replicas reach the
/// desired count.
///
/// Transient fetch errors are retried until `policy.timeout`. A workload that
/// stays absent for longer than `policy.not_found_grace` fails with
/// [`HarnessError::NotFound`] without waiting out the full timeout; one that
/// is still absent when the timeout expires is also reported as not found.
/// An error the cluster rejects outright fails immediately.
#[instrument(skip(cluster, policy, cancel))]
pub async fn wait_until_ready<C>(
    cluster: &C,
    namespace: &str,
    name: &str,
    policy: &WaitPolicy,
    cancel: &CancellationToken,
) -> Result<WorkloadHandle>
where
    C: ClusterClient + ?Sized,
{
    let start = Instant::now();
    let deadline = start + policy.timeout;
    let mut last_observed: Option<WorkloadHandle> = None;
    let mut missing_since: Option<Instant> = None;

    loop {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(HarnessError::Cancelled { last_observed });
            }
            res = cluster.get_workload(namespace, name) => Some(res),
            _ = sleep_until(deadline) => None,
        };

        match fetched {
            Some(Ok(handle)) if handle.ready => {
                info!(
                    available = handle.observed_available_replicas,
                    desired = handle.desired_replicas,
                    "Workload ready after {:?}",
                    start.elapsed()
                );
                return Ok(handle);
            }
            Some(Ok(handle)) => {
                debug!(
                    available = handle.observed_available_replicas,
                    desired = handle.desired_replicas,
                    "Workload not ready yet"
                );
                missing_since = None;
                last_observed = Some(handle);
            }
            Some(Err(ClusterError::NotFound)) => {
                let since = *missing_since.get_or_insert_with(Instant::now);
                if since.elapsed() >= policy.not_found_grace {
                    warn!("Workload still absent after {:?}", since.elapsed());
                    return Err(HarnessError::NotFound {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    });
                }
                debug!("Workload not found yet");
            }
            Some(Err(ClusterError::Transient(e))) => {
                debug!("Transient error fetching workload, retrying: {}", e);
            }
            Some(Err(ClusterError::Rejected(e))) => {
                return Err(HarnessError::Cluster(e));
            }
            None => warn!("Workload fetch did not complete before the deadline"),
        }

        let now = Instant::now();
        if now >= deadline {
            if missing_since.is_some() {
                warn!("Workload still absent at the deadline");
                return Err(HarnessError::NotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            return Err(HarnessError::Timeout {
                namespace: namespace.to_string(),
                name: name.to_string(),
                elapsed: now - start,
                last_observed,
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(HarnessError::Cancelled { last_observed });
            }
            _ = sleep(policy.poll_interval.min(deadline - now)) => {}
        }
    }
}
