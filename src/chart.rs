// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Chart references and discovery of charts on disk.

use crate::constants::{naming, CHART_FILE};
use crate::error::{HarnessError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// The subset of `Chart.yaml` chartcheck cares about
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
}

/// A chart directory on disk together with its parsed metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartRef {
    pub path: PathBuf,
    pub metadata: ChartMetadata,
}

impl ChartRef {
    /// Load a chart from its directory, resolving the path to an absolute one
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = std::path::absolute(path.as_ref()).map_err(|e| {
            HarnessError::Chart(format!(
                "Failed to resolve chart path {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let metadata = read_metadata(&path)?;
        Ok(Self { path, metadata })
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Application version, falling back to `v{version}` when the chart has none
    pub fn app_version(&self) -> Option<String> {
        self.metadata.app_version.clone().or_else(|| {
            self.metadata
                .version
                .as_ref()
                .map(|version| format!("v{}", version))
        })
    }
}

fn read_metadata(dir: &Path) -> Result<ChartMetadata> {
    let file = dir.join(CHART_FILE);
    let content = fs::read_to_string(&file)
        .map_err(|e| HarnessError::Chart(format!("Failed to read {}: {}", file.display(), e)))?;

    let metadata: ChartMetadata = serde_yaml::from_str(&content)
        .map_err(|e| HarnessError::Chart(format!("Failed to parse {}: {}", file.display(), e)))?;

    if metadata.name.trim().is_empty() {
        return Err(HarnessError::Chart(format!(
            "{} has an empty name",
            file.display()
        )));
    }

    Ok(metadata)
}

/// Find every chart below `root`, skipping charts whose name is in `exclusions`.
///
/// Results are ordered shallow-first, then by chart name. Unreadable
/// directories and unparseable `Chart.yaml` files are skipped with a warning.
pub fn find_all_charts(root: impl AsRef<Path>, exclusions: &[String]) -> Result<Vec<ChartRef>> {
    let root = std::path::absolute(root.as_ref()).map_err(|e| {
        HarnessError::Chart(format!(
            "Failed to resolve charts root {}: {}",
            root.as_ref().display(),
            e
        ))
    })?;
    if !root.is_dir() {
        return Err(HarnessError::Chart(format!(
            "Charts root {} is not a directory",
            root.display()
        )));
    }

    let mut found = Vec::new();
    walk(&root, &mut found);

    let mut charts: Vec<(usize, ChartRef)> = found
        .into_iter()
        .filter(|chart| !exclusions.iter().any(|name| name == chart.name()))
        .map(|chart| {
            let depth = chart
                .path
                .strip_prefix(&root)
                .map(|rel| rel.components().count())
                .unwrap_or_default();
            (depth, chart)
        })
        .collect();

    charts.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.name().cmp(b.name())));

    Ok(charts.into_iter().map(|(_, chart)| chart).collect())
}

/// Collect every chart below `root`. Symlinks are not followed, so a link
/// back to an ancestor cannot make the walk revisit the same chart.
fn walk(root: &Path, found: &mut Vec<ChartRef>) {
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != std::ffi::OsStr::new(CHART_FILE) {
            continue;
        }

        let Some(dir) = entry.path().parent() else {
            continue;
        };
        match read_metadata(dir) {
            Ok(metadata) => {
                debug!("Found chart {} at {}", metadata.name, dir.display());
                found.push(ChartRef {
                    path: dir.to_path_buf(),
                    metadata,
                });
            }
            Err(e) => warn!("Skipping chart: {}", e),
        }
    }
}

/// Turn a chart name into a prefix usable in a namespace name.
///
/// Lowercases, replaces anything outside `[a-z0-9-]` with `-` and trims
/// leading and trailing dashes.
pub fn release_prefix(chart: &ChartRef) -> String {
    let sanitized: String = chart
        .name()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    let trimmed = sanitized.trim_matches('-');

    if trimmed.is_empty() {
        naming::FALLBACK_PREFIX.to_string()
    } else {
        trimmed.to_string()
    }
}
