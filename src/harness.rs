// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Verification harness: acquire a namespace, install the chart, wait for the
//! workload, assert on it, and always clean up.

use crate::chart::ChartRef;
use crate::error::HarnessError;
use crate::installer::PackageInstaller;
use crate::kubernetes::{ClusterClient, ClusterError};
use crate::scope::{self, ScopeGuard};
use crate::types::{Release, WaitPolicy, WorkloadHandle};
use crate::wait::wait_until_ready;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};

/// Step of a verification run
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Acquiring,
    Installing,
    Waiting,
    Asserting,
    Cleanup,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Why a run failed
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    Provisioning,
    Install,
    NotFound,
    Timeout,
    Assertion,
    Cancelled,
    Cluster,
    Aborted,
}

impl From<&HarnessError> for FailureKind {
    fn from(err: &HarnessError) -> Self {
        match err {
            HarnessError::Provisioning(_) => FailureKind::Provisioning,
            HarnessError::Install(_) | HarnessError::Uninstall(_) | HarnessError::Chart(_) => {
                FailureKind::Install
            }
            HarnessError::NotFound { .. } => FailureKind::NotFound,
            HarnessError::Timeout { .. } => FailureKind::Timeout,
            HarnessError::Assertion(_) => FailureKind::Assertion,
            HarnessError::Cancelled { .. } => FailureKind::Cancelled,
            HarnessError::KubeError(_)
            | HarnessError::KubeconfigError(_)
            | HarnessError::Cluster(_) => FailureKind::Cluster,
        }
    }
}

/// Verdict of one run
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub chart: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    /// Last observed workload state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<WorkloadHandle>,
    /// Cleanup problems; these never change the outcome
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleanup_errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl VerificationResult {
    fn new(chart: &ChartRef, started_at: DateTime<Utc>) -> Self {
        Self {
            chart: chart.name().to_string(),
            outcome: Outcome::Succeeded,
            reason: None,
            failure: None,
            failed_phase: None,
            namespace: None,
            release_name: None,
            diagnostics: None,
            cleanup_errors: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    fn fail(&mut self, phase: Phase, err: &HarnessError) {
        self.outcome = Outcome::Failed;
        self.reason = Some(err.to_string());
        self.failure = Some(FailureKind::from(err));
        self.failed_phase = Some(phase);
        if let Some(handle) = err.last_observed() {
            self.diagnostics = Some(handle.clone());
        }
    }

    fn aborted(chart: &ChartRef, reason: String) -> Self {
        let mut result = Self::new(chart, Utc::now());
        result.outcome = Outcome::Failed;
        result.failure = Some(FailureKind::Aborted);
        result.reason = Some(reason);
        result
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }
}

/// A failed step together with the workload state seen so far
struct StepFailure {
    phase: Phase,
    error: HarnessError,
    diagnostics: Option<WorkloadHandle>,
}

impl StepFailure {
    fn new(phase: Phase, error: HarnessError) -> Self {
        Self {
            phase,
            error,
            diagnostics: None,
        }
    }
}

/// Runs the install-wait-assert sequence for a chart.
///
/// Holds no per-run state; every run gets its own namespace, so one harness
/// can drive any number of concurrent runs.
pub struct VerificationHarness<C, I>
where
    C: ClusterClient + 'static,
    I: PackageInstaller + 'static,
{
    cluster: Arc<C>,
    installer: Arc<I>,
}

impl<C, I> Clone for VerificationHarness<C, I>
where
    C: ClusterClient + 'static,
    I: PackageInstaller + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cluster: self.cluster.clone(),
            installer: self.installer.clone(),
        }
    }
}

impl<C, I> VerificationHarness<C, I>
where
    C: ClusterClient + 'static,
    I: PackageInstaller + 'static,
{
    pub fn new(cluster: Arc<C>, installer: Arc<I>) -> Self {
        Self { cluster, installer }
    }

    pub async fn run(&self, chart: &ChartRef, policy: &WaitPolicy) -> VerificationResult {
        self.run_with_cancel(chart, policy, &CancellationToken::new())
            .await
    }

    /// Run one verification. Cancelling `cancel` aborts the readiness wait and
    /// proceeds straight to cleanup.
    pub async fn run_with_cancel(
        &self,
        chart: &ChartRef,
        policy: &WaitPolicy,
        cancel: &CancellationToken,
    ) -> VerificationResult {
        let span = info_span!("verify", chart = %chart.name(), namespace = field::Empty);
        self.execute(chart, policy, cancel).instrument(span).await
    }

    async fn execute(
        &self,
        chart: &ChartRef,
        policy: &WaitPolicy,
        cancel: &CancellationToken,
    ) -> VerificationResult {
        let mut result = VerificationResult::new(chart, Utc::now());

        info!(phase = ?Phase::Acquiring, "Acquiring namespace");
        let mut guard = match scope::acquire(self.cluster.clone(), chart).await {
            Ok(guard) => guard,
            Err(e) => {
                error!("Failed to acquire namespace: {}", e);
                result.fail(Phase::Acquiring, &e);
                result.finished_at = Utc::now();
                return result;
            }
        };
        Span::current().record("namespace", guard.id());
        result.namespace = Some(guard.id().to_string());
        result.release_name = Some(guard.scope().release_name().to_string());

        let mut release: Option<Release> = None;
        match self
            .install_and_verify(&guard, chart, policy, cancel, &mut release)
            .await
        {
            Ok(handle) => {
                info!("Verification succeeded");
                result.diagnostics = Some(handle);
            }
            Err(failure) => {
                error!(phase = ?failure.phase, "Verification failed: {}", failure.error);
                result.fail(failure.phase, &failure.error);
                if failure.diagnostics.is_some() {
                    result.diagnostics = failure.diagnostics;
                }
            }
        }

        info!(phase = ?Phase::Cleanup, "Cleaning up");
        result.cleanup_errors = self.cleanup(&mut guard, release.as_mut()).await;
        result.finished_at = Utc::now();
        result
    }

    async fn install_and_verify(
        &self,
        guard: &ScopeGuard<C>,
        chart: &ChartRef,
        policy: &WaitPolicy,
        cancel: &CancellationToken,
        release: &mut Option<Release>,
    ) -> Result<WorkloadHandle, StepFailure> {
        let scope = guard.scope();
        let release_name = scope.release_name();

        info!(phase = ?Phase::Installing, "Installing release {}", release_name);
        let release = match self.installer.install(scope, chart, release_name).await {
            Ok(installed) => release.insert(installed),
            Err(e) => {
                // helm may have recorded the release before failing
                *release = Some(Release::pending(scope, chart));
                return Err(StepFailure::new(Phase::Installing, e));
            }
        };

        info!(phase = ?Phase::Waiting, "Waiting for workload {}", release.name);
        wait_until_ready(
            self.cluster.as_ref(),
            &release.namespace,
            &release.name,
            policy,
            cancel,
        )
        .await
        .map_err(|e| StepFailure::new(Phase::Waiting, e))?;

        info!(phase = ?Phase::Asserting, "Checking final workload state");
        let handle = self
            .cluster
            .get_workload(&release.namespace, &release.name)
            .await
            .map_err(|e| {
                let error = match e {
                    ClusterError::NotFound => HarnessError::NotFound {
                        namespace: release.namespace.clone(),
                        name: release.name.clone(),
                    },
                    other => HarnessError::Cluster(other.to_string()),
                };
                StepFailure::new(Phase::Asserting, error)
            })?;

        if handle.name != release.name {
            return Err(StepFailure {
                phase: Phase::Asserting,
                error: HarnessError::Assertion(format!(
                    "expected workload named {}, found {}",
                    release.name, handle.name
                )),
                diagnostics: Some(handle),
            });
        }

        Ok(handle)
    }

    /// Uninstall the release, then delete the namespace. Failures are
    /// collected and returned rather than propagated.
    ///
    /// A release whose install failed is still uninstalled, but an error
    /// doing so is only logged since the release may never have existed.
    async fn cleanup(
        &self,
        guard: &mut ScopeGuard<C>,
        release: Option<&mut Release>,
    ) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(release) = release {
            match self.installer.uninstall(release).await {
                Ok(()) => release.installed = false,
                Err(e) if release.installed => {
                    warn!("Failed to uninstall release {}: {}", release.name, e);
                    errors.push(e.to_string());
                }
                Err(e) => debug!("Uninstall of failed release {} skipped: {}", release.name, e),
            }
        }

        if let Err(e) = guard.release().await {
            warn!("Failed to release namespace: {}", e);
            errors.push(e.to_string());
        }

        errors
    }
}

/// Verify several charts, each in its own task and namespace.
/// Verdicts are returned in the order of `charts`.
pub async fn verify_all<C, I>(
    harness: &VerificationHarness<C, I>,
    charts: &[ChartRef],
    policy: &WaitPolicy,
    cancel: &CancellationToken,
) -> Vec<VerificationResult>
where
    C: ClusterClient + 'static,
    I: PackageInstaller + 'static,
{
    let tasks = charts.iter().map(|chart| {
        let harness = harness.clone();
        let chart = chart.clone();
        let policy = *policy;
        let cancel = cancel.clone();
        tokio::spawn(async move { harness.run_with_cancel(&chart, &policy, &cancel).await })
    });

    join_all(tasks)
        .await
        .into_iter()
        .zip(charts)
        .map(|(joined, chart)| {
            joined.unwrap_or_else(|e| {
                error!(chart = %chart.name(), "Verification task failed: {}", e);
                VerificationResult::aborted(chart, format!("verification task failed: {}", e))
            })
        })
        .collect()
}
