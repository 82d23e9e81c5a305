// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod chart;
pub mod config;
pub mod constants;
pub mod error;
pub mod harness;
pub mod installer;
pub mod kubernetes;
pub mod scope;
pub mod types;
pub mod wait;

#[cfg(test)]
mod test_utils;
