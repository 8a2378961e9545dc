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

//! Ordered publish sequence with compensation.
//!
//! 1. download the validation copy
//! 2. save it as the public copy
//! 3. mark the package `Available` (committed)
//! 4. delete the validation copy
//!
//! If step 3 fails the public copy is deleted before the error is returned.
//! Step 4 is cleanup only; its failure is logged.

use super::ReconcileError;
use crate::models::{Package, PackageStatus};
use crate::telemetry::events;
use crate::traits::{PackageFileStore, ValidationRegistry};
use tracing::{error, info, warn};

pub(crate) async fn publish(
    registry: &dyn ValidationRegistry,
    files: &dyn PackageFileStore,
    package: &Package,
) -> Result<(), ReconcileError> {
    let content = files.download_validation_copy(package).await?;
    files.save_public_copy(package, &content).await?;

    if let Err(source) = registry
        .update_package_status(package, PackageStatus::Available, true)
        .await
    {
        match files
            .delete_public_copy(&package.id, &package.normalized_version)
            .await
        {
            Ok(()) => warn!(
                event_type = events::PACKAGE_PUBLISH_ROLLBACK,
                package_id = %package.id,
                package_version = %package.normalized_version,
                error = %source,
                "Status update failed, public copy removed"
            ),
            Err(rollback_error) => error!(
                event_type = events::PACKAGE_PUBLISH_ROLLBACK_FAILED,
                package_id = %package.id,
                package_version = %package.normalized_version,
                error = %source,
                rollback_error = %rollback_error,
                "Status update failed and the public copy could not be removed"
            ),
        }
        return Err(ReconcileError::Publish {
            package: package.to_string(),
            source,
        });
    }

    info!(
        event_type = events::PACKAGE_PUBLISHED,
        package_id = %package.id,
        package_version = %package.normalized_version,
        bytes = content.len(),
        "Package published"
    );

    if let Err(cleanup_error) = files
        .delete_validation_copy(&package.id, &package.normalized_version)
        .await
    {
        warn!(
            event_type = events::PACKAGE_CLEANUP_FAILED,
            package_id = %package.id,
            package_version = %package.normalized_version,
            error = %cleanup_error,
            "Failed to delete validation copy after publishing"
        );
    }

    Ok(())
}
