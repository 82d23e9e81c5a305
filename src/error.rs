// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::WorkloadHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Invalid chart: {0}")]
    Chart(String),

    #[error("Namespace provisioning failed: {0}")]
    Provisioning(String),

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Uninstall failed: {0}")]
    Uninstall(String),

    #[error("Workload {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("Workload {namespace}/{name} not ready after {elapsed:?}")]
    Timeout {
        namespace: String,
        name: String,
        elapsed: Duration,
        last_observed: Option<WorkloadHandle>,
    },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Wait for workload was cancelled")]
    Cancelled { last_observed: Option<WorkloadHandle> },

    #[error("Cluster rejected request: {0}")]
    Cluster(String),
}

impl HarnessError {
    /// Last workload snapshot seen before the failure, if any
    pub fn last_observed(&self) -> Option<&WorkloadHandle> {
        match self {
            HarnessError::Timeout { last_observed, .. }
            | HarnessError::Cancelled { last_observed } => last_observed.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
