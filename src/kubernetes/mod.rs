// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster access: the capability surface the harness consumes and its kube-rs implementation.

pub mod client;
pub mod cluster;
pub mod namespaces;

pub use client::connect;
pub use cluster::KubeCluster;

use crate::types::WorkloadHandle;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single cluster API call, classified by whether retrying can help
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("resource not found")]
    NotFound,

    #[error("transient cluster error: {0}")]
    Transient(String),

    #[error("{0}")]
    Rejected(String),
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => match resp.code {
                404 => ClusterError::NotFound,
                408 | 429 | 500..=599 => ClusterError::Transient(resp.message),
                code => ClusterError::Rejected(format!("{} ({}): {}", resp.reason, code, resp.message)),
            },
            kube::Error::SerdeError(e) => ClusterError::Rejected(format!("invalid response: {}", e)),
            other => ClusterError::Transient(other.to_string()),
        }
    }
}

/// Operations the harness needs from the cluster API
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Create a namespace; fails if it already exists
    async fn create_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError>;

    /// Delete a namespace; deleting an absent namespace succeeds
    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError>;

    /// Whether a live (not terminating) namespace with this name exists
    async fn namespace_exists(&self, name: &str) -> Result<bool, ClusterError>;

    /// Fetch the current status of a workload
    async fn get_workload(&self, namespace: &str, name: &str)
        -> Result<WorkloadHandle, ClusterError>;
}

#[async_trait]
impl<C: ClusterClient + ?Sized> ClusterClient for Arc<C> {
    async fn create_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        (**self).create_namespace(name, labels).await
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        (**self).delete_namespace(name).await
    }

    async fn namespace_exists(&self, name: &str) -> Result<bool, ClusterError> {
        (**self).namespace_exists(name).await
    }

    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<WorkloadHandle, ClusterError> {
        (**self).get_workload(namespace, name).await
    }
}
