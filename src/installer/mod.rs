// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Package manager capability surface and its helm CLI implementation.

pub mod helm;

pub use helm::HelmInstaller;

use crate::chart::ChartRef;
use crate::error::Result;
use crate::types::{Release, Scope};
use async_trait::async_trait;
use std::sync::Arc;

/// Installs and removes named releases of a chart.
///
/// `install` returns once the package manager has submitted the resources;
/// it does not wait for them to become healthy.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(&self, scope: &Scope, chart: &ChartRef, release_name: &str) -> Result<Release>;

    /// Remove a release. Removing a release that is already gone succeeds.
    async fn uninstall(&self, release: &Release) -> Result<()>;
}

#[async_trait]
impl<I: PackageInstaller + ?Sized> PackageInstaller for Arc<I> {
    async fn install(&self, scope: &Scope, chart: &ChartRef, release_name: &str) -> Result<Release> {
        (**self).install(scope, chart, release_name).await
    }

    async fn uninstall(&self, release: &Release) -> Result<()> {
        (**self).uninstall(release).await
    }
}
