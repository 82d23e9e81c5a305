// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::chart::ChartRef;
use chrono::{DateTime, Utc};

/// Isolated namespace owned by a single verification run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub released: bool,
}

impl Scope {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            released: false,
        }
    }

    /// Name of the release installed into this scope.
    /// Each scope holds exactly one release, named after the namespace.
    pub fn release_name(&self) -> &str {
        &self.id
    }
}

/// An installed instance of a chart inside a scope
#[derive(Clone, Debug)]
pub struct Release {
    pub name: String,
    pub namespace: String,
    pub chart: ChartRef,
    pub installed: bool,
}

impl Release {
    /// The release a failed install may have left behind in `scope`
    pub fn pending(scope: &Scope, chart: &ChartRef) -> Self {
        Self {
            name: scope.release_name().to_string(),
            namespace: scope.id.clone(),
            chart: chart.clone(),
            installed: false,
        }
    }
}
