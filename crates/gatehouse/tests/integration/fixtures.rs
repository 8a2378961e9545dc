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

//! Recording fakes for the boundary traits.
//!
//! Every fake appends to a shared [`OperationLog`] so tests can assert on
//! the order of side effects, and exposes switches for injecting failures.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use gatehouse::{
    CertificateKey, CertificateRegistry, CertificateValidationAttempt, EndCertificate,
    FixedClock, MemoryRegistry, Notifier, NotifierError, Package, PackageFileStore,
    PackageSignature, PackageStatus, PackageValidationMessage, PolicySnapshot, RecheckScheduler,
    RegistryError, RegistrySnapshot, SchedulerError, SignatureKey, StorageError, Telemetry,
    TrustChangeSet, TrustGraph, ValidationOutcomeReconciler, ValidationRegistry, ValidationSet,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Instant every fixed clock in these tests reports.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[derive(Debug, Clone, Default)]
pub struct OperationLog(Arc<Mutex<Vec<String>>>);

impl OperationLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }
}

/// Registry that delegates to [`MemoryRegistry`] and records every call.
pub struct RecordingRegistry {
    pub inner: MemoryRegistry,
    log: OperationLog,
    pub fail_update: AtomicBool,
    pub fail_commit: AtomicBool,
    pub commits: AtomicUsize,
}

impl RecordingRegistry {
    pub fn new(snapshot: RegistrySnapshot, log: OperationLog) -> Self {
        Self {
            inner: MemoryRegistry::from_snapshot(snapshot),
            log,
            fail_update: AtomicBool::new(false),
            fail_commit: AtomicBool::new(false),
            commits: AtomicUsize::new(0),
        }
    }

    pub async fn package_status(&self, key: gatehouse::PackageKey) -> Option<PackageStatus> {
        self.inner
            .snapshot()
            .await
            .packages
            .into_iter()
            .find(|package| package.key == key)
            .map(|package| package.status)
    }
}

#[async_trait]
impl ValidationRegistry for RecordingRegistry {
    async fn get_validation_set(
        &self,
        tracking_id: Uuid,
    ) -> Result<Option<ValidationSet>, RegistryError> {
        self.inner.get_validation_set(tracking_id).await
    }

    async fn get_package(
        &self,
        id: &str,
        normalized_version: &str,
    ) -> Result<Option<Package>, RegistryError> {
        self.inner.get_package(id, normalized_version).await
    }

    async fn update_package_status(
        &self,
        package: &Package,
        status: PackageStatus,
        commit_changes: bool,
    ) -> Result<(), RegistryError> {
        self.log.push(format!("update_status:{}", status));
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend("database unavailable".to_string()));
        }
        self.inner
            .update_package_status(package, status, commit_changes)
            .await
    }

    async fn save_changes(&self) -> Result<(), RegistryError> {
        self.log.push("save_changes");
        self.inner.save_changes().await
    }
}

#[async_trait]
impl CertificateRegistry for RecordingRegistry {
    async fn find_pending_attempt(
        &self,
        certificate_key: CertificateKey,
        validation_id: Uuid,
    ) -> Result<Option<CertificateValidationAttempt>, RegistryError> {
        self.inner
            .find_pending_attempt(certificate_key, validation_id)
            .await
    }

    async fn get_certificate(
        &self,
        key: CertificateKey,
    ) -> Result<Option<EndCertificate>, RegistryError> {
        self.inner.get_certificate(key).await
    }

    async fn load_trust_graph(&self, key: CertificateKey) -> Result<TrustGraph, RegistryError> {
        self.inner.load_trust_graph(key).await
    }

    async fn commit(&self, changes: &TrustChangeSet) -> Result<(), RegistryError> {
        self.log.push("commit");
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend("commit failed".to_string()));
        }
        self.inner.commit(changes).await?;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

type FileKey = (String, String);

/// File store holding validation and public copies in memory.
pub struct RecordingFileStore {
    log: OperationLog,
    pub validation: Mutex<HashMap<FileKey, Vec<u8>>>,
    pub public: Mutex<HashMap<FileKey, Vec<u8>>>,
    pub fail_download: AtomicBool,
    pub fail_save_public: AtomicBool,
    pub fail_delete_validation: AtomicBool,
    pub fail_delete_public: AtomicBool,
}

impl RecordingFileStore {
    pub fn new(log: OperationLog) -> Self {
        Self {
            log,
            validation: Mutex::new(HashMap::new()),
            public: Mutex::new(HashMap::new()),
            fail_download: AtomicBool::new(false),
            fail_save_public: AtomicBool::new(false),
            fail_delete_validation: AtomicBool::new(false),
            fail_delete_public: AtomicBool::new(false),
        }
    }

    pub fn put_validation_copy(&self, package: &Package, content: &[u8]) {
        self.validation
            .lock()
            .unwrap()
            .insert(file_key(&package.id, &package.normalized_version), content.to_vec());
    }

    pub fn has_public_copy(&self, package: &Package) -> bool {
        self.public
            .lock()
            .unwrap()
            .contains_key(&file_key(&package.id, &package.normalized_version))
    }

    pub fn has_validation_copy(&self, package: &Package) -> bool {
        self.validation
            .lock()
            .unwrap()
            .contains_key(&file_key(&package.id, &package.normalized_version))
    }
}

fn file_key(id: &str, version: &str) -> FileKey {
    (id.to_lowercase(), version.to_lowercase())
}

fn io_error(id: &str, version: &str, reason: &str) -> StorageError {
    StorageError::Io {
        id: id.to_string(),
        version: version.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl PackageFileStore for RecordingFileStore {
    async fn download_validation_copy(&self, package: &Package) -> Result<Vec<u8>, StorageError> {
        self.log.push("download");
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(io_error(&package.id, &package.normalized_version, "download failed"));
        }
        self.validation
            .lock()
            .unwrap()
            .get(&file_key(&package.id, &package.normalized_version))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                id: package.id.clone(),
                version: package.normalized_version.clone(),
            })
    }

    async fn save_public_copy(
        &self,
        package: &Package,
        content: &[u8],
    ) -> Result<(), StorageError> {
        self.log.push("save_public");
        if self.fail_save_public.load(Ordering::SeqCst) {
            return Err(io_error(&package.id, &package.normalized_version, "upload failed"));
        }
        self.public.lock().unwrap().insert(
            file_key(&package.id, &package.normalized_version),
            content.to_vec(),
        );
        Ok(())
    }

    async fn delete_validation_copy(&self, id: &str, version: &str) -> Result<(), StorageError> {
        self.log.push("delete_validation");
        if self.fail_delete_validation.load(Ordering::SeqCst) {
            return Err(io_error(id, version, "delete failed"));
        }
        self.validation.lock().unwrap().remove(&file_key(id, version));
        Ok(())
    }

    async fn delete_public_copy(&self, id: &str, version: &str) -> Result<(), StorageError> {
        self.log.push("delete_public");
        if self.fail_delete_public.load(Ordering::SeqCst) {
            return Err(io_error(id, version, "delete failed"));
        }
        self.public.lock().unwrap().remove(&file_key(id, version));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingScheduler {
    pub scheduled: Mutex<Vec<(PackageValidationMessage, DateTime<Utc>)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl RecheckScheduler for RecordingScheduler {
    async fn schedule_recheck(
        &self,
        message: &PackageValidationMessage,
        not_before: DateTime<Utc>,
    ) -> Result<(), SchedulerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SchedulerError::Enqueue {
                tracking_id: message.validation_tracking_id,
                reason: "queue unavailable".to_string(),
            });
        }
        self.scheduled
            .lock()
            .unwrap()
            .push((message.clone(), not_before));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ValidationFailed(String),
    SignedValidationFailed(String),
    Published(String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    fn record(&self, notification: Notification) -> Result<(), NotifierError> {
        self.sent.lock().unwrap().push(notification);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifierError::Delivery("smtp unavailable".to_string()));
        }
        Ok(())
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_validation_failed(&self, package: &Package) -> Result<(), NotifierError> {
        self.record(Notification::ValidationFailed(package.id.clone()))
    }

    async fn notify_signed_validation_failed(
        &self,
        package: &Package,
    ) -> Result<(), NotifierError> {
        self.record(Notification::SignedValidationFailed(package.id.clone()))
    }

    async fn notify_published(&self, package: &Package) -> Result<(), NotifierError> {
        self.record(Notification::Published(package.id.clone()))
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    pub durations: Mutex<Vec<(Duration, bool)>>,
    pub status_changes: Mutex<Vec<(PackageStatus, PackageStatus)>>,
    pub alerts: Mutex<Vec<CertificateKey>>,
    pub invalidated: Mutex<Vec<SignatureKey>>,
}

impl RecordingTelemetry {
    pub fn durations(&self) -> Vec<(Duration, bool)> {
        self.durations.lock().unwrap().clone()
    }

    pub fn status_changes(&self) -> Vec<(PackageStatus, PackageStatus)> {
        self.status_changes.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<CertificateKey> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn invalidated(&self) -> Vec<SignatureKey> {
        self.invalidated.lock().unwrap().clone()
    }
}

impl Telemetry for RecordingTelemetry {
    fn record_total_duration(&self, duration: Duration, succeeded: bool) {
        self.durations.lock().unwrap().push((duration, succeeded));
    }

    fn record_status_change(&self, from: PackageStatus, to: PackageStatus) {
        self.status_changes.lock().unwrap().push((from, to));
    }

    fn record_certificate_alert(&self, certificate: &EndCertificate) {
        self.alerts.lock().unwrap().push(certificate.key);
    }

    fn record_signature_invalidated(&self, signature: &PackageSignature) {
        self.invalidated.lock().unwrap().push(signature.key);
    }
}

/// Wires a reconciler to recording fakes around a registry snapshot.
pub struct Harness {
    pub log: OperationLog,
    pub registry: Arc<RecordingRegistry>,
    pub files: Arc<RecordingFileStore>,
    pub scheduler: Arc<RecordingScheduler>,
    pub notifier: Arc<RecordingNotifier>,
    pub telemetry: Arc<RecordingTelemetry>,
}

impl Harness {
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        let log = OperationLog::default();
        Self {
            registry: Arc::new(RecordingRegistry::new(snapshot, log.clone())),
            files: Arc::new(RecordingFileStore::new(log.clone())),
            scheduler: Arc::new(RecordingScheduler::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            telemetry: Arc::new(RecordingTelemetry::default()),
            log,
        }
    }

    pub fn reconciler(&self) -> ValidationOutcomeReconciler {
        ValidationOutcomeReconciler::new(
            self.registry.clone(),
            self.files.clone(),
            self.scheduler.clone(),
            self.notifier.clone(),
            self.telemetry.clone(),
        )
        .with_clock(Arc::new(FixedClock(now())))
    }
}

/// Default policy: recheck every minute, five failures before escalation.
pub fn default_policy() -> PolicySnapshot {
    PolicySnapshot::new(Duration::seconds(60), 5)
}
