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

//! # Validation Outcome Reconciler
//!
//! Turns the persisted validations of a set into a package status.
//!
//! ## Transitions
//!
//! | Current            | Classification | Result                           |
//! |--------------------|----------------|----------------------------------|
//! | `Validating`       | all succeeded  | publish, `Available`             |
//! | `Validating`       | hard failed    | `FailedValidation`, notify owner |
//! | `Validating`       | pending        | unchanged, schedule re-check     |
//! | `Available`        | any            | unchanged                        |
//! | `FailedValidation` | all succeeded  | publish, `Available`             |
//! | `FailedValidation` | otherwise      | unchanged                        |
//!
//! The policy snapshot is passed to every call; the reconciler keeps no
//! configuration of its own.
//!
//! ## Example
//!
//! ```rust,ignore
//! let reconciler =
//!     ValidationOutcomeReconciler::new(registry, files, scheduler, notifier, telemetry);
//! let outcome = reconciler.handle_message(&policy, &message).await?;
//! println!("{} -> {}", outcome.previous_status, outcome.status);
//! ```

mod classify;
mod publish;

pub use classify::{classify, next_transition, recheck_period, SetClassification, Transition};

use crate::error::{RegistryError, SchedulerError, StorageError};
use crate::models::{Package, PackageStatus, PackageValidationMessage, ValidationSet};
use crate::policy::{PolicyResolver, PolicySnapshot, ResolvedValidation};
use crate::telemetry::events;
use crate::time::{Clock, SystemClock};
use crate::traits::{Notifier, PackageFileStore, RecheckScheduler, Telemetry, ValidationRegistry};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors that abort a reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Validation set not found: {0}")]
    ValidationSetNotFound(Uuid),

    #[error("Package not found: {id} {version}")]
    PackageNotFound { id: String, version: String },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Package storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Publishing {package} failed and was rolled back: {source}")]
    Publish {
        package: String,
        #[source]
        source: RegistryError,
    },

    #[error("Scheduling error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub previous_status: PackageStatus,
    pub status: PackageStatus,
    pub classification: SetClassification,
    /// Set when a re-check was scheduled
    pub recheck_at: Option<DateTime<Utc>>,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        self.previous_status != self.status
    }
}

/// Computes package status from validation outcomes and drives the side
/// effects of each transition.
pub struct ValidationOutcomeReconciler {
    registry: Arc<dyn ValidationRegistry>,
    files: Arc<dyn PackageFileStore>,
    scheduler: Arc<dyn RecheckScheduler>,
    notifier: Arc<dyn Notifier>,
    telemetry: Arc<dyn Telemetry>,
    clock: Arc<dyn Clock>,
}

impl ValidationOutcomeReconciler {
    pub fn new(
        registry: Arc<dyn ValidationRegistry>,
        files: Arc<dyn PackageFileStore>,
        scheduler: Arc<dyn RecheckScheduler>,
        notifier: Arc<dyn Notifier>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            registry,
            files,
            scheduler,
            notifier,
            telemetry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve the set and package named by a message, then reconcile.
    ///
    /// Nothing is mutated when either cannot be found.
    pub async fn handle_message(
        &self,
        policy: &PolicySnapshot,
        message: &PackageValidationMessage,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let set = self
            .registry
            .get_validation_set(message.validation_tracking_id)
            .await?
            .ok_or(ReconcileError::ValidationSetNotFound(
                message.validation_tracking_id,
            ))?;

        let mut package = self
            .registry
            .get_package(&set.package_id, &set.package_normalized_version)
            .await?
            .ok_or_else(|| ReconcileError::PackageNotFound {
                id: set.package_id.clone(),
                version: set.package_normalized_version.clone(),
            })?;

        self.process_validation_outcome(policy, &set, &mut package)
            .await
    }

    /// Reconcile one validation set against its package.
    ///
    /// `package.status` reflects the persisted status when this returns,
    /// whether or not an error occurred. The total duration is recorded
    /// exactly once.
    pub async fn process_validation_outcome(
        &self,
        policy: &PolicySnapshot,
        set: &ValidationSet,
        package: &mut Package,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let previous_status = package.status;
        let resolved = PolicyResolver::new(policy).resolve(set);
        let classification = classify(&resolved);

        debug!(
            validation_tracking_id = %set.tracking_id,
            package_id = %package.id,
            package_version = %package.normalized_version,
            status = %previous_status,
            classification = %classification,
            validations = resolved.len(),
            "Reconciling validation set"
        );

        let result = self
            .apply(policy, set, package, &resolved, classification)
            .await;

        let succeeded = package.status == PackageStatus::Available;
        self.telemetry
            .record_total_duration(self.clock.now() - set.created, succeeded);

        if package.status != previous_status {
            info!(
                event_type = events::PACKAGE_STATUS_CHANGED,
                validation_tracking_id = %set.tracking_id,
                package_id = %package.id,
                package_version = %package.normalized_version,
                from = %previous_status,
                to = %package.status,
                "Package status changed"
            );
            self.telemetry
                .record_status_change(previous_status, package.status);
        }

        let recheck_at = result?;
        Ok(ReconcileOutcome {
            previous_status,
            status: package.status,
            classification,
            recheck_at,
        })
    }

    async fn apply(
        &self,
        policy: &PolicySnapshot,
        set: &ValidationSet,
        package: &mut Package,
        resolved: &[ResolvedValidation<'_>],
        classification: SetClassification,
    ) -> Result<Option<DateTime<Utc>>, ReconcileError> {
        match next_transition(package.status, classification) {
            Transition::Promote => {
                publish::publish(self.registry.as_ref(), self.files.as_ref(), package).await?;
                package.status = PackageStatus::Available;
                if let Err(e) = self.notifier.notify_published(package).await {
                    log_notification_failure(package, &e);
                }
                Ok(None)
            }
            Transition::Reject => {
                self.registry
                    .update_package_status(package, PackageStatus::FailedValidation, true)
                    .await?;
                package.status = PackageStatus::FailedValidation;

                let signed_only = resolved
                    .iter()
                    .filter(|item| item.is_hard_failure())
                    .all(|item| item.validation.failed_only_because_signed());
                let notified = if signed_only {
                    self.notifier.notify_signed_validation_failed(package).await
                } else {
                    self.notifier.notify_validation_failed(package).await
                };
                if let Err(e) = notified {
                    log_notification_failure(package, &e);
                }
                Ok(None)
            }
            Transition::AwaitRecheck => {
                let period = recheck_period(resolved, policy.default_recheck_period());
                let not_before = self.clock.now() + period;
                let message = PackageValidationMessage::recheck(set, package);
                self.scheduler.schedule_recheck(&message, not_before).await?;
                info!(
                    event_type = events::VALIDATION_RECHECK_SCHEDULED,
                    validation_tracking_id = %set.tracking_id,
                    package_id = %package.id,
                    package_version = %package.version,
                    not_before = %not_before.to_rfc3339(),
                    "Validation set re-check scheduled"
                );
                Ok(Some(not_before))
            }
            Transition::Unchanged => Ok(None),
        }
    }
}

fn log_notification_failure(package: &Package, error: &dyn std::error::Error) {
    warn!(
        event_type = events::NOTIFICATION_FAILED,
        package_id = %package.id,
        package_version = %package.normalized_version,
        error = %error,
        "Failed to notify package owner"
    );
}
