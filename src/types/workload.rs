// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::wait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Read-only snapshot of a deployed workload, re-fetched on every poll
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadHandle {
    pub namespace: String,
    pub name: String,
    pub desired_replicas: i32,
    pub observed_available_replicas: i32,
    pub ready: bool,
}

impl WorkloadHandle {
    pub fn new(namespace: &str, name: &str, desired: i32, available: i32) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            desired_replicas: desired,
            observed_available_replicas: available,
            ready: available >= desired,
        }
    }

    /// Build a snapshot from a Deployment.
    /// An unset `spec.replicas` means 1, matching the API server default.
    pub fn from_deployment(deployment: &Deployment) -> Self {
        let desired = deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1);
        let available = deployment
            .status
            .as_ref()
            .and_then(|s| s.available_replicas)
            .unwrap_or(0);

        Self::new(
            &deployment.namespace().unwrap_or_default(),
            &deployment.name_any(),
            desired,
            available,
        )
    }
}

/// How long and how often to poll a workload for readiness
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// How long a missing workload is tolerated before failing fast
    pub not_found_grace: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            ..Default::default()
        }
    }

    pub fn with_not_found_grace(mut self, grace: Duration) -> Self {
        self.not_found_grace = grace;
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(wait::TIMEOUT_SECS),
            poll_interval: Duration::from_secs(wait::POLL_INTERVAL_SECS),
            not_found_grace: Duration::from_secs(wait::NOT_FOUND_GRACE_SECS),
        }
    }
}
