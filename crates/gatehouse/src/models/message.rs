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

//! Queue message payloads consumed by the reconciler and the propagator.

use super::certificate::CertificateKey;
use super::package::Package;
use super::validation::ValidationSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asks for a validation set to be (re-)reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageValidationMessage {
    pub validation_tracking_id: Uuid,
    pub package_id: String,
    pub package_version: String,
}

impl PackageValidationMessage {
    pub fn new(
        validation_tracking_id: Uuid,
        package_id: impl Into<String>,
        package_version: impl Into<String>,
    ) -> Self {
        Self {
            validation_tracking_id,
            package_id: package_id.into(),
            package_version: package_version.into(),
        }
    }

    /// Builds the re-check message for a set that is still in flight.
    pub fn recheck(set: &ValidationSet, package: &Package) -> Self {
        Self::new(set.tracking_id, set.package_id.clone(), package.version.clone())
    }
}

/// Delivers the verification of one certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateValidationMessage {
    pub certificate_key: CertificateKey,
    pub validation_id: Uuid,
}

impl CertificateValidationMessage {
    pub fn new(certificate_key: CertificateKey, validation_id: Uuid) -> Self {
        Self {
            certificate_key,
            validation_id,
        }
    }
}
