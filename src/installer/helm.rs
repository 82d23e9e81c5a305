// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::PackageInstaller;
use crate::chart::ChartRef;
use crate::constants::HELM_BINARY;
use crate::error::{HarnessError, Result};
use crate::types::{Release, Scope};
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// What helm prints when asked to uninstall a release it does not know
const RELEASE_NOT_FOUND: &str = "release: not found";

/// Installs charts by shelling out to the `helm` CLI
#[derive(Debug, Clone)]
pub struct HelmInstaller {
    binary: String,
    extra_args: Vec<String>,
}

impl HelmInstaller {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
        }
    }

    /// Additional arguments passed to every `helm install`, e.g. `--set key=value`
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    fn install_args(&self, namespace: &str, chart: &ChartRef, release_name: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "install".into(),
            release_name.into(),
            chart.path.clone().into_os_string(),
            "--namespace".into(),
            namespace.into(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    fn uninstall_args(release: &Release) -> Vec<OsString> {
        vec![
            "uninstall".into(),
            release.name.as_str().into(),
            "--namespace".into(),
            release.namespace.as_str().into(),
        ]
    }

    /// Run helm, returning stderr as the error on a non-zero exit
    async fn run(&self, args: Vec<OsString>) -> std::result::Result<String, String> {
        debug!("Running {} {:?}", self.binary, args);

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.binary, e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(format!("{} exited with {}: {}", self.binary, output.status, stderr))
        }
    }
}

impl Default for HelmInstaller {
    fn default() -> Self {
        Self::new(HELM_BINARY)
    }
}

#[async_trait]
impl PackageInstaller for HelmInstaller {
    #[instrument(skip(self, scope, chart), fields(namespace = %scope.id, chart = %chart.name()))]
    async fn install(&self, scope: &Scope, chart: &ChartRef, release_name: &str) -> Result<Release> {
        self.run(self.install_args(&scope.id, chart, release_name))
            .await
            .map_err(HarnessError::Install)?;

        info!("Release {} submitted", release_name);
        Ok(Release {
            name: release_name.to_string(),
            namespace: scope.id.clone(),
            chart: chart.clone(),
            installed: true,
        })
    }

    #[instrument(skip(self, release), fields(release = %release.name, namespace = %release.namespace))]
    async fn uninstall(&self, release: &Release) -> Result<()> {
        match self.run(Self::uninstall_args(release)).await {
            Ok(_) => {
                info!("Release {} uninstalled", release.name);
                Ok(())
            }
            Err(stderr) if stderr.contains(RELEASE_NOT_FOUND) => {
                debug!("Release {} already gone", release.name);
                Ok(())
            }
            Err(stderr) => Err(HarnessError::Uninstall(stderr)),
        }
    }
}
