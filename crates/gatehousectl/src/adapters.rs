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

//! Local implementations of the boundary traits used by the CLI.
//!
//! Package files live in two directories on disk. Re-checks and
//! notifications are logged rather than delivered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse::{
    Notifier, NotifierError, Package, PackageFileStore, PackageValidationMessage,
    RecheckScheduler, SchedulerError, StorageError,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Package files stored as `<id>.<version>.nupkg` under two directories.
#[derive(Debug, Clone)]
pub struct FsFileStore {
    validation_dir: PathBuf,
    public_dir: PathBuf,
}

impl FsFileStore {
    pub fn new(validation_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            validation_dir: validation_dir.into(),
            public_dir: public_dir.into(),
        }
    }

    pub fn file_name(id: &str, version: &str) -> String {
        format!("{}.{}.nupkg", id.to_lowercase(), version.to_lowercase())
    }

    fn validation_path(&self, id: &str, version: &str) -> PathBuf {
        self.validation_dir.join(Self::file_name(id, version))
    }

    fn public_path(&self, id: &str, version: &str) -> PathBuf {
        self.public_dir.join(Self::file_name(id, version))
    }
}

fn io_error(id: &str, version: &str, error: std::io::Error) -> StorageError {
    if error.kind() == ErrorKind::NotFound {
        StorageError::NotFound {
            id: id.to_string(),
            version: version.to_string(),
        }
    } else {
        StorageError::Io {
            id: id.to_string(),
            version: version.to_string(),
            reason: error.to_string(),
        }
    }
}

async fn remove_if_present(path: &Path, id: &str, version: &str) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(id, version, e)),
    }
}

#[async_trait]
impl PackageFileStore for FsFileStore {
    async fn download_validation_copy(&self, package: &Package) -> Result<Vec<u8>, StorageError> {
        let path = self.validation_path(&package.id, &package.normalized_version);
        tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(&package.id, &package.normalized_version, e))
    }

    async fn save_public_copy(
        &self,
        package: &Package,
        content: &[u8],
    ) -> Result<(), StorageError> {
        let (id, version) = (&package.id, &package.normalized_version);
        tokio::fs::create_dir_all(&self.public_dir)
            .await
            .map_err(|e| io_error(id, version, e))?;
        tokio::fs::write(self.public_path(id, version), content)
            .await
            .map_err(|e| io_error(id, version, e))
    }

    async fn delete_validation_copy(&self, id: &str, version: &str) -> Result<(), StorageError> {
        remove_if_present(&self.validation_path(id, version), id, version).await
    }

    async fn delete_public_copy(&self, id: &str, version: &str) -> Result<(), StorageError> {
        remove_if_present(&self.public_path(id, version), id, version).await
    }
}

/// Logs re-check messages instead of enqueueing them.
#[derive(Debug, Default)]
pub struct LoggingScheduler;

#[async_trait]
impl RecheckScheduler for LoggingScheduler {
    async fn schedule_recheck(
        &self,
        message: &PackageValidationMessage,
        not_before: DateTime<Utc>,
    ) -> Result<(), SchedulerError> {
        let payload =
            serde_json::to_string(message).map_err(|e| SchedulerError::Enqueue {
                tracking_id: message.validation_tracking_id,
                reason: e.to_string(),
            })?;
        info!(
            not_before = %not_before.to_rfc3339(),
            payload = %payload,
            "Re-check message ready to enqueue"
        );
        Ok(())
    }
}

/// Logs owner notifications.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify_validation_failed(&self, package: &Package) -> Result<(), NotifierError> {
        info!(package = %package, "Notify owner: validation failed");
        Ok(())
    }

    async fn notify_signed_validation_failed(
        &self,
        package: &Package,
    ) -> Result<(), NotifierError> {
        info!(package = %package, "Notify owner: signed packages are not accepted");
        Ok(())
    }

    async fn notify_published(&self, package: &Package) -> Result<(), NotifierError> {
        info!(package = %package, "Notify owner: package published");
        Ok(())
    }
}
