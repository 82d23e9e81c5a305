// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use super::ClusterError;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Create a labelled namespace. An existing namespace with the same name is an error.
#[instrument(skip(client, labels))]
pub async fn create_namespace(
    client: &Client,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> Result<(), ClusterError> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        ..Default::default()
    };
    namespaces.create(&PostParams::default(), &ns).await?;
    info!("Namespace {} created", namespace);
    Ok(())
}

/// Request deletion of a namespace, treating an absent namespace as already deleted
#[instrument(skip(client))]
pub async fn delete_namespace(client: &Client, namespace: &str) -> Result<(), ClusterError> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.delete(namespace, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Namespace {} deletion requested", namespace);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("Namespace {} already gone", namespace);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Check whether a namespace exists and is not being torn down
pub async fn namespace_exists(client: &Client, namespace: &str) -> Result<bool, ClusterError> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get_opt(namespace).await? {
        Some(ns) => {
            let terminating = ns
                .status
                .and_then(|s| s.phase)
                .is_some_and(|phase| phase == "Terminating");
            Ok(!terminating)
        }
        None => Ok(false),
    }
}
