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

//! Serializable registry contents.

use crate::error::RegistryError;
use crate::models::{
    CertificateValidationAttempt, EndCertificate, Package, PackageSignature, PackageSigningState,
    TrustedTimestamp, ValidationSet,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Flat JSON document holding every entity of a [`MemoryRegistry`](super::MemoryRegistry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub validation_sets: Vec<ValidationSet>,
    #[serde(default)]
    pub certificates: Vec<EndCertificate>,
    #[serde(default)]
    pub certificate_validations: Vec<CertificateValidationAttempt>,
    #[serde(default)]
    pub signatures: Vec<PackageSignature>,
    #[serde(default)]
    pub timestamps: Vec<TrustedTimestamp>,
    #[serde(default)]
    pub signing_states: Vec<PackageSigningState>,
}

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn with_validation_set(mut self, set: ValidationSet) -> Self {
        self.validation_sets.push(set);
        self
    }

    pub fn with_certificate(mut self, certificate: EndCertificate) -> Self {
        self.certificates.push(certificate);
        self
    }

    pub fn with_certificate_validation(mut self, attempt: CertificateValidationAttempt) -> Self {
        self.certificate_validations.push(attempt);
        self
    }

    pub fn with_signature(mut self, signature: PackageSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn with_timestamp(mut self, timestamp: TrustedTimestamp) -> Self {
        self.timestamps.push(timestamp);
        self
    }

    pub fn with_signing_state(mut self, state: PackageSigningState) -> Self {
        self.signing_states.push(state);
        self
    }

    /// Read a snapshot from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| {
            RegistryError::Snapshot(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_slice(&content).map_err(|e| {
            RegistryError::Snapshot(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Write the snapshot as pretty-printed JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let content = serde_json::to_vec_pretty(self)
            .map_err(|e| RegistryError::Snapshot(format!("failed to serialize snapshot: {}", e)))?;
        tokio::fs::write(path, content).await.map_err(|e| {
            RegistryError::Snapshot(format!("failed to write {}: {}", path.display(), e))
        })
    }
}
