// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes label keys set on every namespace chartcheck creates
pub mod labels {
    /// Always "true"; marks namespaces that are safe to garbage collect
    pub const MANAGED: &str = "chartcheck.dev/managed";
    /// Name of the chart under test
    pub const CHART: &str = "chartcheck.dev/chart";
}

/// Namespace naming
pub mod naming {
    /// Maximum length of a namespace name (DNS-1123 label)
    pub const MAX_NAMESPACE_LEN: usize = 63;
    /// Number of random hex characters appended to the prefix
    pub const SUFFIX_LEN: usize = 12;
    /// Prefix used when a chart name sanitizes to nothing
    pub const FALLBACK_PREFIX: &str = "chart";
}

/// Readiness wait defaults
pub mod wait {
    pub const TIMEOUT_SECS: u64 = 20;
    pub const POLL_INTERVAL_SECS: u64 = 1;
    pub const NOT_FOUND_GRACE_SECS: u64 = 2;
}

/// Default package manager binary
pub const HELM_BINARY: &str = "helm";

/// Name of the file that marks a chart directory
pub const CHART_FILE: &str = "Chart.yaml";
