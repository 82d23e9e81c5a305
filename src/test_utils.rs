// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API and in-memory fakes of the cluster and installer.

use crate::chart::{ChartMetadata, ChartRef};
use crate::error::HarnessError;
use crate::installer::PackageInstaller;
use crate::kubernetes::{ClusterClient, ClusterError};
use crate::types::{Release, Scope, WorkloadHandle};
use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a response for requests with the given method matching the exact path
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "https://kubernetes.default.svc")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Try prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            match response {
                Some((status, body)) => Ok(Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(body.into_bytes()))
                    .unwrap()),
                None => {
                    // Default 404 for unmatched requests
                    let body = r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#;
                    Ok(Response::builder()
                        .status(404)
                        .header("content-type", "application/json")
                        .body(Body::from(body.as_bytes().to_vec()))
                        .unwrap())
                }
            }
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock Deployment JSON response
pub fn deployment_json(namespace: &str, name: &str, replicas: i32, available: i32) -> String {
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "spec": {
            "replicas": replicas,
            "selector": { "matchLabels": { "app": name } },
            "template": { "metadata": { "labels": { "app": name } } }
        },
        "status": {
            "availableReplicas": available
        }
    })
    .to_string()
}

/// Create a failure Status response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// One scripted answer of [`FakeCluster::get_workload`]
#[derive(Clone, Debug)]
pub enum WorkloadStep {
    Missing,
    Transient,
    Rejected,
    Replicas { desired: i32, available: i32 },
    /// A ready workload reporting a different name than the one requested
    Renamed { name: String },
}

#[derive(Default)]
struct FakeClusterState {
    namespaces: HashMap<String, BTreeMap<String, String>>,
    delete_calls: HashMap<String, usize>,
    create_failure: Option<ClusterError>,
    delete_failure: Option<ClusterError>,
    steps: VecDeque<WorkloadStep>,
    get_calls: usize,
}

/// In-memory [`ClusterClient`] with scripted workload status and failure injection.
///
/// Workload steps are consumed one per `get_workload` call; the last step repeats.
#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<FakeClusterState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_steps(steps: impl IntoIterator<Item = WorkloadStep>) -> Self {
        let cluster = Self::new();
        cluster.state.lock().unwrap().steps = steps.into_iter().collect();
        cluster
    }

    pub fn fail_create_namespace(&self, err: ClusterError) {
        self.state.lock().unwrap().create_failure = Some(err);
    }

    pub fn fail_delete_namespace(&self, err: ClusterError) {
        self.state.lock().unwrap().delete_failure = Some(err);
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.state.lock().unwrap().namespaces.contains_key(name)
    }

    pub fn namespace_labels(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.state.lock().unwrap().namespaces.get(name).cloned()
    }

    pub fn namespace_count(&self) -> usize {
        self.state.lock().unwrap().namespaces.len()
    }

    pub fn delete_calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .delete_calls
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn create_namespace(
        &self,
        name: &str,
        labels: &BTreeMap<String, String>,
    ) -> std::result::Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.create_failure.clone() {
            return Err(err);
        }
        if state.namespaces.contains_key(name) {
            return Err(ClusterError::Rejected(format!(
                "namespaces \"{}\" already exists",
                name
            )));
        }
        state.namespaces.insert(name.to_string(), labels.clone());
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> std::result::Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        *state.delete_calls.entry(name.to_string()).or_default() += 1;
        if let Some(err) = state.delete_failure.clone() {
            return Err(err);
        }
        state.namespaces.remove(name);
        Ok(())
    }

    async fn namespace_exists(&self, name: &str) -> std::result::Result<bool, ClusterError> {
        Ok(self.has_namespace(name))
    }

    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<WorkloadHandle, ClusterError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        let step = if state.steps.len() > 1 {
            state.steps.pop_front()
        } else {
            state.steps.front().cloned()
        };

        match step.unwrap_or(WorkloadStep::Missing) {
            WorkloadStep::Missing => Err(ClusterError::NotFound),
            WorkloadStep::Transient => Err(ClusterError::Transient(
                "connection refused".to_string(),
            )),
            WorkloadStep::Rejected => Err(ClusterError::Rejected(
                "deployments.apps is forbidden".to_string(),
            )),
            WorkloadStep::Replicas { desired, available } => {
                Ok(WorkloadHandle::new(namespace, name, desired, available))
            }
            WorkloadStep::Renamed { name } => Ok(WorkloadHandle::new(namespace, &name, 1, 1)),
        }
    }
}

#[derive(Default)]
struct FakeInstallerState {
    releases: HashSet<(String, String)>,
    install_failure: Option<String>,
    uninstall_failure: Option<String>,
    uninstall_calls: usize,
}

/// In-memory [`PackageInstaller`] with failure injection
#[derive(Clone, Default)]
pub struct FakeInstaller {
    state: Arc<Mutex<FakeInstallerState>>,
}

impl FakeInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_install(&self, message: &str) {
        self.state.lock().unwrap().install_failure = Some(message.to_string());
    }

    pub fn fail_uninstall(&self, message: &str) {
        self.state.lock().unwrap().uninstall_failure = Some(message.to_string());
    }

    pub fn release_count(&self) -> usize {
        self.state.lock().unwrap().releases.len()
    }

    pub fn uninstall_calls(&self) -> usize {
        self.state.lock().unwrap().uninstall_calls
    }
}

#[async_trait]
impl PackageInstaller for FakeInstaller {
    async fn install(
        &self,
        scope: &Scope,
        chart: &ChartRef,
        release_name: &str,
    ) -> crate::error::Result<Release> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.install_failure.clone() {
            return Err(HarnessError::Install(message));
        }
        state
            .releases
            .insert((scope.id.clone(), release_name.to_string()));
        Ok(Release {
            name: release_name.to_string(),
            namespace: scope.id.clone(),
            chart: chart.clone(),
            installed: true,
        })
    }

    async fn uninstall(&self, release: &Release) -> crate::error::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.uninstall_calls += 1;
        if let Some(message) = state.uninstall_failure.clone() {
            return Err(HarnessError::Uninstall(message));
        }
        state
            .releases
            .remove(&(release.namespace.clone(), release.name.clone()));
        Ok(())
    }
}

/// A chart reference that does not need to exist on disk
pub fn make_chart(name: &str) -> ChartRef {
    ChartRef {
        path: std::path::PathBuf::from("/charts").join(name),
        metadata: ChartMetadata {
            name: name.to_string(),
            version: Some("0.1.0".to_string()),
            app_version: None,
        },
    }
}
