/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Prometheus recorder for the metrics emitted during one command.
//!
//! The CLI is short-lived, so instead of serving a scrape endpoint the
//! rendered exposition text is written to a file when the command ends.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

/// Install the process-wide recorder.
pub fn install() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")
}

/// Write everything recorded so far in Prometheus text format.
pub async fn write(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    tokio::fs::write(path, handle.render())
        .await
        .with_context(|| format!("Failed to write metrics to {}", path.display()))
}
