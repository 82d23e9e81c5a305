// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::{namespaces, ClusterClient, ClusterError};
use crate::types::WorkloadHandle;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::instrument;

/// [`ClusterClient`] backed by a live Kubernetes API server.
/// Workloads are looked up as Deployments.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn create_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        namespaces::create_namespace(&self.client, name, labels).await
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        namespaces::delete_namespace(&self.client, name).await
    }

    async fn namespace_exists(&self, name: &str) -> Result<bool, ClusterError> {
        namespaces::namespace_exists(&self.client, name).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<WorkloadHandle, ClusterError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployment = deployments.get(name).await?;
        Ok(WorkloadHandle::from_deployment(&deployment))
    }
}
