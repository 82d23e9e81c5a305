// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Values passed between the steps of a verification run.

pub mod release;
pub mod workload;

pub use release::{Release, Scope};
pub use workload::{WaitPolicy, WorkloadHandle};
