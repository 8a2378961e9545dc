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

//! Indexed view of the signatures that depend on one certificate.
//!
//! The graph holds owned copies keyed by identifier. Signatures point at
//! certificates and packages by key, timestamps point at their signature and
//! issuing certificate by key. Cascades walk these indices.

use crate::models::{
    CertificateKey, CertificateValidationAttempt, EndCertificate, PackageKey, PackageSignature,
    PackageSignatureStatus, PackageSigningState, PackageSigningStatus, SignatureKey, TimestampKey,
    TrustedTimestamp,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which signatures an invalidated certificate takes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeRule {
    /// Every tied signature, regardless of time.
    Unconditional,
    /// Only signatures anchored strictly after the revocation instant.
    RevokedAt(DateTime<Utc>),
}

/// Signatures, timestamps and signing states reachable from a certificate.
///
/// A registry loads every signature tied to the certificate (directly or
/// through a timestamp it issued), all timestamps of those signatures, and
/// for each owning package its signing state together with all of its
/// other signatures, so that signing states can be recomputed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustGraph {
    pub signatures: BTreeMap<SignatureKey, PackageSignature>,
    pub timestamps: BTreeMap<TimestampKey, TrustedTimestamp>,
    pub signing_states: BTreeMap<PackageKey, PackageSigningState>,
}

impl TrustGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signature(mut self, signature: PackageSignature) -> Self {
        self.signatures.insert(signature.key, signature);
        self
    }

    pub fn with_timestamp(mut self, timestamp: TrustedTimestamp) -> Self {
        self.timestamps.insert(timestamp.key, timestamp);
        self
    }

    pub fn with_signing_state(mut self, state: PackageSigningState) -> Self {
        self.signing_states.insert(state.package_key, state);
        self
    }

    /// Timestamps anchoring the given signature.
    pub fn timestamps_for(
        &self,
        signature: SignatureKey,
    ) -> impl Iterator<Item = &TrustedTimestamp> + '_ {
        self.timestamps
            .values()
            .filter(move |timestamp| timestamp.signature_key == signature)
    }

    /// Whether a signature must be invalidated after `certificate` lost trust.
    fn is_tainted(
        &self,
        signature: &PackageSignature,
        certificate: CertificateKey,
        rule: CascadeRule,
    ) -> bool {
        let direct = signature.certificate_key == certificate;
        match rule {
            CascadeRule::Unconditional => {
                direct
                    || self
                        .timestamps_for(signature.key)
                        .any(|timestamp| timestamp.certificate_key == certificate)
            }
            CascadeRule::RevokedAt(revoked_at) => {
                self.timestamps_for(signature.key).any(|timestamp| {
                    // A direct signature is judged by any of its timestamps; an
                    // indirect one only by the timestamps the certificate issued.
                    let anchored = direct || timestamp.certificate_key == certificate;
                    anchored && timestamp.value > revoked_at
                })
            }
        }
    }

    /// Compute the invalidation cascade for `certificate`.
    ///
    /// Only signatures currently `Valid` are returned, so applying the same
    /// cascade twice yields nothing the second time. Signing states are
    /// returned only when their status changes.
    pub fn cascade(
        &self,
        certificate: CertificateKey,
        rule: CascadeRule,
    ) -> (Vec<PackageSignature>, Vec<PackageSigningState>) {
        let invalidated: Vec<PackageSignature> = self
            .signatures
            .values()
            .filter(|signature| signature.status == PackageSignatureStatus::Valid)
            .filter(|signature| self.is_tainted(signature, certificate, rule))
            .map(|signature| PackageSignature {
                status: PackageSignatureStatus::Invalid,
                ..signature.clone()
            })
            .collect();

        let invalidated_keys: BTreeSet<SignatureKey> =
            invalidated.iter().map(|signature| signature.key).collect();
        let packages: BTreeSet<PackageKey> = invalidated
            .iter()
            .map(|signature| signature.package_key)
            .collect();

        let signing_states = packages
            .into_iter()
            .filter_map(|package_key| {
                let status = PackageSigningStatus::from_signatures(
                    self.signatures
                        .values()
                        .filter(|signature| signature.package_key == package_key)
                        .map(|signature| {
                            if invalidated_keys.contains(&signature.key) {
                                PackageSignatureStatus::Invalid
                            } else {
                                signature.status
                            }
                        }),
                );
                match self.signing_states.get(&package_key) {
                    Some(state) if state.signing_status == status => None,
                    _ => Some(PackageSigningState::new(package_key, status)),
                }
            })
            .collect();

        (invalidated, signing_states)
    }
}

/// Every mutation produced by one verification result, committed at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustChangeSet {
    pub certificate: EndCertificate,
    pub attempt: CertificateValidationAttempt,
    pub invalidated_signatures: Vec<PackageSignature>,
    pub signing_states: Vec<PackageSigningState>,
}
