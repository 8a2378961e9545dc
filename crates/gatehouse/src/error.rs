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

//! Error types surfaced by the external collaborators.
//!
//! Each boundary trait in [`crate::traits`] reports failures through one of
//! these enums. The reconciler and propagator wrap them in their own error
//! types.

use crate::models::CertificateKey;
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by a validation registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation set not found: {0}")]
    ValidationSetNotFound(Uuid),

    #[error("Package not found: {id} {version}")]
    PackageNotFound { id: String, version: String },

    #[error("Certificate not found: {0}")]
    CertificateNotFound(CertificateKey),

    #[error("Concurrent modification detected: {0}")]
    Conflict(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Registry backend error: {0}")]
    Backend(String),
}

/// Errors reported by the package file store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Package file not found: {id} {version}")]
    NotFound { id: String, version: String },

    #[error("Package file operation failed for {id} {version}: {reason}")]
    Io {
        id: String,
        version: String,
        reason: String,
    },
}

/// Errors reported when enqueueing a re-check message.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to enqueue re-check for {tracking_id}: {reason}")]
    Enqueue { tracking_id: Uuid, reason: String },
}

/// Errors reported by the notifier.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
}
