// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{wait, HELM_BINARY};
use crate::types::WaitPolicy;
use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which charts to verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSelection {
    /// A single chart directory
    Single(PathBuf),
    /// Every chart found below a root directory, minus the named exclusions
    Discover {
        root: PathBuf,
        exclusions: Vec<String>,
    },
}

/// Runner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub charts: ChartSelection,
    pub wait_policy: WaitPolicy,
    pub helm_binary: String,
    /// Extra arguments appended to every `helm install`
    pub helm_extra_args: Vec<String>,
    /// Kubeconfig context to use instead of the current one
    pub kube_context: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let charts = match (lookup("CHART_PATH"), lookup("CHARTS_ROOT")) {
            (Some(path), None) => ChartSelection::Single(PathBuf::from(path)),
            (None, Some(root)) => ChartSelection::Discover {
                root: PathBuf::from(root),
                exclusions: lookup("CHART_EXCLUSIONS")
                    .map(|list| {
                        list.split(',')
                            .map(str::trim)
                            .filter(|name| !name.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            (Some(_), Some(_)) => bail!("CHART_PATH and CHARTS_ROOT are mutually exclusive"),
            (None, None) => bail!("Either CHART_PATH or CHARTS_ROOT environment variable must be set"),
        };

        let secs = |key: &str, default: u64| -> Result<Duration> {
            match lookup(key) {
                Some(value) => value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} must be a whole number of seconds", key)),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let wait_policy = WaitPolicy {
            timeout: secs("WAIT_TIMEOUT_SECS", wait::TIMEOUT_SECS)?,
            poll_interval: secs("POLL_INTERVAL_SECS", wait::POLL_INTERVAL_SECS)?,
            not_found_grace: secs("NOT_FOUND_GRACE_SECS", wait::NOT_FOUND_GRACE_SECS)?,
        };
        if wait_policy.poll_interval.is_zero() {
            bail!("POLL_INTERVAL_SECS must be greater than zero");
        }
        if wait_policy.not_found_grace >= wait_policy.timeout {
            bail!("NOT_FOUND_GRACE_SECS must be less than WAIT_TIMEOUT_SECS");
        }

        Ok(Config {
            charts,
            wait_policy,
            helm_binary: lookup("HELM_BINARY").unwrap_or_else(|| HELM_BINARY.to_string()),
            helm_extra_args: lookup("HELM_EXTRA_ARGS")
                .map(|args| args.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            kube_context: lookup("KUBE_CONTEXT").filter(|c| !c.is_empty()),
        })
    }
}
