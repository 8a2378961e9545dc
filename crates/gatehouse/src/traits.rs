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

//! Boundary contracts for the collaborators gatehouse orchestrates.
//!
//! Storage, queues, email and metrics sinks all live outside this crate.
//! The reconciler and the propagator only talk to them through these traits.
//! Implementations must be thread-safe (`Send + Sync`); the core holds no
//! mutable state of its own between calls.

use crate::error::{NotifierError, RegistryError, SchedulerError, StorageError};
use crate::models::{
    CertificateKey, CertificateValidationAttempt, EndCertificate, Package, PackageSignature,
    PackageStatus, PackageValidationMessage, ValidationSet,
};
use crate::trust::{TrustChangeSet, TrustGraph};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Persisted validation sets and package rows.
#[async_trait]
pub trait ValidationRegistry: Send + Sync {
    /// Find a validation set by its tracking id.
    async fn get_validation_set(
        &self,
        tracking_id: Uuid,
    ) -> Result<Option<ValidationSet>, RegistryError>;

    /// Find a package version by id and normalized version.
    async fn get_package(
        &self,
        id: &str,
        normalized_version: &str,
    ) -> Result<Option<Package>, RegistryError>;

    /// Change the status of a package.
    ///
    /// With `commit_changes` false the change is staged until
    /// [`save_changes`](Self::save_changes) is called.
    async fn update_package_status(
        &self,
        package: &Package,
        status: PackageStatus,
        commit_changes: bool,
    ) -> Result<(), RegistryError>;

    /// Commit every staged change.
    async fn save_changes(&self) -> Result<(), RegistryError>;
}

/// Persisted certificates, attempts and the signatures that depend on them.
#[async_trait]
pub trait CertificateRegistry: Send + Sync {
    /// Find the attempt matching both keys, only while it has no result yet.
    async fn find_pending_attempt(
        &self,
        certificate_key: CertificateKey,
        validation_id: Uuid,
    ) -> Result<Option<CertificateValidationAttempt>, RegistryError>;

    async fn get_certificate(
        &self,
        key: CertificateKey,
    ) -> Result<Option<EndCertificate>, RegistryError>;

    /// Load every signature tied to the certificate, directly or through a
    /// trusted timestamp, together with the signing states that own them.
    async fn load_trust_graph(&self, key: CertificateKey) -> Result<TrustGraph, RegistryError>;

    /// Apply a change set in a single atomic commit.
    async fn commit(&self, changes: &TrustChangeSet) -> Result<(), RegistryError>;
}

/// Package file storage, split between the validation container and the
/// public container.
#[async_trait]
pub trait PackageFileStore: Send + Sync {
    async fn download_validation_copy(&self, package: &Package) -> Result<Vec<u8>, StorageError>;

    async fn save_public_copy(&self, package: &Package, content: &[u8])
        -> Result<(), StorageError>;

    async fn delete_validation_copy(&self, id: &str, version: &str) -> Result<(), StorageError>;

    async fn delete_public_copy(&self, id: &str, version: &str) -> Result<(), StorageError>;
}

/// Delayed delivery of re-check messages.
#[async_trait]
pub trait RecheckScheduler: Send + Sync {
    async fn schedule_recheck(
        &self,
        message: &PackageValidationMessage,
        not_before: DateTime<Utc>,
    ) -> Result<(), SchedulerError>;
}

/// Owner-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_validation_failed(&self, package: &Package) -> Result<(), NotifierError>;

    /// Sent instead of the generic failure when the package was rejected
    /// only because it is signed.
    async fn notify_signed_validation_failed(&self, package: &Package)
        -> Result<(), NotifierError>;

    async fn notify_published(&self, package: &Package) -> Result<(), NotifierError>;
}

/// Operational measurements. Recording never fails and never drives a
/// decision.
pub trait Telemetry: Send + Sync {
    fn record_total_duration(&self, duration: Duration, succeeded: bool);

    fn record_status_change(&self, from: PackageStatus, to: PackageStatus);

    fn record_certificate_alert(&self, certificate: &EndCertificate);

    fn record_signature_invalidated(&self, signature: &PackageSignature);
}
