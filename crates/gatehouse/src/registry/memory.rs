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

//! In-memory registry implementing both registry contracts.
//!
//! Package status updates can be staged and committed later with
//! `save_changes`. A trust change set is checked in full before any of it
//! is applied, under one write lock, so a rejected commit leaves no trace.

use super::snapshot::RegistrySnapshot;
use crate::error::RegistryError;
use crate::models::{
    CertificateKey, CertificateValidationAttempt, EndCertificate, Package, PackageKey,
    PackageSignature, PackageSigningState, PackageStatus, SignatureKey, TimestampKey,
    TrustedTimestamp, ValidationSet,
};
use crate::traits::{CertificateRegistry, ValidationRegistry};
use crate::trust::{TrustChangeSet, TrustGraph};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    packages: BTreeMap<PackageKey, Package>,
    validation_sets: HashMap<Uuid, ValidationSet>,
    certificates: BTreeMap<CertificateKey, EndCertificate>,
    attempts: BTreeMap<(CertificateKey, Uuid), CertificateValidationAttempt>,
    signatures: BTreeMap<SignatureKey, PackageSignature>,
    timestamps: BTreeMap<TimestampKey, TrustedTimestamp>,
    signing_states: BTreeMap<PackageKey, PackageSigningState>,
    staged: Vec<(PackageKey, PackageStatus)>,
}

impl State {
    fn apply_staged(&mut self) {
        for (key, status) in self.staged.drain(..) {
            if let Some(package) = self.packages.get_mut(&key) {
                package.status = status;
            }
        }
    }
}

/// Registry held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: RwLock<State>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let state = State {
            packages: snapshot
                .packages
                .into_iter()
                .map(|package| (package.key, package))
                .collect(),
            validation_sets: snapshot
                .validation_sets
                .into_iter()
                .map(|set| (set.tracking_id, set))
                .collect(),
            certificates: snapshot
                .certificates
                .into_iter()
                .map(|certificate| (certificate.key, certificate))
                .collect(),
            attempts: snapshot
                .certificate_validations
                .into_iter()
                .map(|attempt| ((attempt.certificate_key, attempt.validation_id), attempt))
                .collect(),
            signatures: snapshot
                .signatures
                .into_iter()
                .map(|signature| (signature.key, signature))
                .collect(),
            timestamps: snapshot
                .timestamps
                .into_iter()
                .map(|timestamp| (timestamp.key, timestamp))
                .collect(),
            signing_states: snapshot
                .signing_states
                .into_iter()
                .map(|state| (state.package_key, state))
                .collect(),
            staged: Vec::new(),
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy out the committed contents. Staged changes are not included.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read().await;
        let mut validation_sets: Vec<ValidationSet> =
            state.validation_sets.values().cloned().collect();
        validation_sets.sort_by_key(|set| set.created);

        RegistrySnapshot {
            packages: state.packages.values().cloned().collect(),
            validation_sets,
            certificates: state.certificates.values().cloned().collect(),
            certificate_validations: state.attempts.values().cloned().collect(),
            signatures: state.signatures.values().cloned().collect(),
            timestamps: state.timestamps.values().cloned().collect(),
            signing_states: state.signing_states.values().cloned().collect(),
        }
    }

    /// Number of package status changes waiting for `save_changes`.
    pub async fn staged_changes(&self) -> usize {
        self.state.read().await.staged.len()
    }
}

#[async_trait]
impl ValidationRegistry for MemoryRegistry {
    async fn get_validation_set(
        &self,
        tracking_id: Uuid,
    ) -> Result<Option<ValidationSet>, RegistryError> {
        Ok(self
            .state
            .read()
            .await
            .validation_sets
            .get(&tracking_id)
            .cloned())
    }

    async fn get_package(
        &self,
        id: &str,
        normalized_version: &str,
    ) -> Result<Option<Package>, RegistryError> {
        let state = self.state.read().await;
        Ok(state
            .packages
            .values()
            .find(|package| {
                package.id.eq_ignore_ascii_case(id)
                    && package.normalized_version.eq_ignore_ascii_case(normalized_version)
            })
            .cloned())
    }

    async fn update_package_status(
        &self,
        package: &Package,
        status: PackageStatus,
        commit_changes: bool,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        if !state.packages.contains_key(&package.key) {
            return Err(RegistryError::PackageNotFound {
                id: package.id.clone(),
                version: package.normalized_version.clone(),
            });
        }
        state.staged.push((package.key, status));
        if commit_changes {
            state.apply_staged();
        }
        Ok(())
    }

    async fn save_changes(&self) -> Result<(), RegistryError> {
        self.state.write().await.apply_staged();
        Ok(())
    }
}

#[async_trait]
impl CertificateRegistry for MemoryRegistry {
    async fn find_pending_attempt(
        &self,
        certificate_key: CertificateKey,
        validation_id: Uuid,
    ) -> Result<Option<CertificateValidationAttempt>, RegistryError> {
        let state = self.state.read().await;
        Ok(state
            .attempts
            .get(&(certificate_key, validation_id))
            .filter(|attempt| attempt.is_pending())
            .cloned())
    }

    async fn get_certificate(
        &self,
        key: CertificateKey,
    ) -> Result<Option<EndCertificate>, RegistryError> {
        Ok(self.state.read().await.certificates.get(&key).cloned())
    }

    async fn load_trust_graph(&self, key: CertificateKey) -> Result<TrustGraph, RegistryError> {
        let state = self.state.read().await;

        let tied: BTreeSet<SignatureKey> = state
            .signatures
            .values()
            .filter(|signature| signature.certificate_key == key)
            .map(|signature| signature.key)
            .chain(
                state
                    .timestamps
                    .values()
                    .filter(|timestamp| timestamp.certificate_key == key)
                    .map(|timestamp| timestamp.signature_key),
            )
            .collect();

        let packages: BTreeSet<PackageKey> = tied
            .iter()
            .filter_map(|signature| state.signatures.get(signature))
            .map(|signature| signature.package_key)
            .collect();

        let signatures: BTreeMap<SignatureKey, PackageSignature> = state
            .signatures
            .values()
            .filter(|signature| packages.contains(&signature.package_key))
            .map(|signature| (signature.key, signature.clone()))
            .collect();
        let timestamps = state
            .timestamps
            .values()
            .filter(|timestamp| signatures.contains_key(&timestamp.signature_key))
            .map(|timestamp| (timestamp.key, timestamp.clone()))
            .collect();
        let signing_states = packages
            .iter()
            .filter_map(|package| state.signing_states.get(package))
            .map(|signing_state| (signing_state.package_key, signing_state.clone()))
            .collect();

        let graph = TrustGraph {
            signatures,
            timestamps,
            signing_states,
        };

        debug!(
            certificate_key = %key,
            signatures = graph.signatures.len(),
            timestamps = graph.timestamps.len(),
            "Loaded trust graph"
        );
        Ok(graph)
    }

    async fn commit(&self, changes: &TrustChangeSet) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;

        let certificate_key = changes.certificate.key;
        if !state.certificates.contains_key(&certificate_key) {
            return Err(RegistryError::CertificateNotFound(certificate_key));
        }
        let attempt_key = (changes.attempt.certificate_key, changes.attempt.validation_id);
        match state.attempts.get(&attempt_key) {
            Some(attempt) if attempt.is_pending() => {}
            Some(_) => {
                return Err(RegistryError::Conflict(format!(
                    "certificate validation {} already has a result",
                    changes.attempt.validation_id
                )))
            }
            None => {
                return Err(RegistryError::Conflict(format!(
                    "certificate validation {} does not exist",
                    changes.attempt.validation_id
                )))
            }
        }
        if let Some(missing) = changes
            .invalidated_signatures
            .iter()
            .find(|signature| !state.signatures.contains_key(&signature.key))
        {
            return Err(RegistryError::Conflict(format!(
                "signature {} does not exist",
                missing.key
            )));
        }

        state
            .certificates
            .insert(certificate_key, changes.certificate.clone());
        state.attempts.insert(attempt_key, changes.attempt.clone());
        for signature in &changes.invalidated_signatures {
            state.signatures.insert(signature.key, signature.clone());
        }
        for signing_state in &changes.signing_states {
            state
                .signing_states
                .insert(signing_state.package_key, signing_state.clone());
        }
        Ok(())
    }
}
