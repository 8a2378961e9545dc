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

//! Implementation of the `reconcile` command.
//!
//! Loads a registry snapshot, reconciles one validation set against its
//! package, and writes the snapshot back. Package files are moved between
//! the validation and public directories on promotion.

use crate::adapters::{FsFileStore, LoggingNotifier, LoggingScheduler};
use anyhow::{Context, Result};
use gatehouse::{
    GatehouseConfig, MemoryRegistry, MetricsTelemetry, PackageValidationMessage, PolicySnapshot,
    ReconcileOutcome, RegistrySnapshot, ValidationOutcomeReconciler, ValidationRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct ReconcileArgs {
    pub snapshot: PathBuf,
    pub tracking_id: Uuid,
    pub validation_dir: PathBuf,
    pub public_dir: PathBuf,
}

pub async fn run(config: &GatehouseConfig, args: &ReconcileArgs) -> Result<ReconcileOutcome> {
    let policy =
        PolicySnapshot::from_config(config).context("Invalid validator configuration")?;

    let snapshot = RegistrySnapshot::load(&args.snapshot)
        .await
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;
    let registry = Arc::new(MemoryRegistry::from_snapshot(snapshot));

    let set = registry
        .get_validation_set(args.tracking_id)
        .await?
        .with_context(|| format!("No validation set with tracking id {}", args.tracking_id))?;
    let message = PackageValidationMessage::new(
        set.tracking_id,
        set.package_id,
        set.package_normalized_version,
    );

    let reconciler = ValidationOutcomeReconciler::new(
        registry.clone(),
        Arc::new(FsFileStore::new(&args.validation_dir, &args.public_dir)),
        Arc::new(LoggingScheduler),
        Arc::new(LoggingNotifier),
        Arc::new(MetricsTelemetry),
    );

    // Whatever was committed before a failure is still written back.
    let result = reconciler.handle_message(&policy, &message).await;

    registry
        .snapshot()
        .await
        .save(&args.snapshot)
        .await
        .with_context(|| format!("Failed to save snapshot {}", args.snapshot.display()))?;

    let outcome = result.context("Reconciliation failed")?;
    info!(
        validation_tracking_id = %args.tracking_id,
        previous_status = %outcome.previous_status,
        status = %outcome.status,
        classification = %outcome.classification,
        "Reconciliation complete"
    );

    match outcome.recheck_at {
        Some(at) => println!(
            "{} -> {} ({}), re-check at {}",
            outcome.previous_status,
            outcome.status,
            outcome.classification,
            at.to_rfc3339()
        ),
        None => println!(
            "{} -> {} ({})",
            outcome.previous_status, outcome.status, outcome.classification
        ),
    }

    Ok(outcome)
}
