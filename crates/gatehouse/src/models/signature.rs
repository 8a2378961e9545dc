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

//! Domain models for package signatures and trusted timestamps.
//!
//! Relationships are expressed through keys rather than references: a
//! signature names its certificate and its package, a timestamp names its
//! issuing certificate and the signature it anchors.

use super::certificate::CertificateKey;
use super::package::PackageKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database key of a package signature.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SignatureKey(pub i64);

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database key of a trusted timestamp.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TimestampKey(pub i64);

/// Status of a single package signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageSignatureStatus {
    Valid,
    Invalid,
}

/// Aggregate signing status of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageSigningStatus {
    Unsigned,
    Valid,
    Invalid,
}

impl PackageSigningStatus {
    /// Derives the aggregate status from the statuses of a package's signatures.
    pub fn from_signatures<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = PackageSignatureStatus>,
    {
        let mut signed = false;
        for status in statuses {
            if status == PackageSignatureStatus::Invalid {
                return PackageSigningStatus::Invalid;
            }
            signed = true;
        }
        if signed {
            PackageSigningStatus::Valid
        } else {
            PackageSigningStatus::Unsigned
        }
    }
}

/// A signature over a package, produced by one end certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSignature {
    pub key: SignatureKey,
    /// Package whose signing state owns this signature
    pub package_key: PackageKey,
    /// Certificate that produced the signature
    pub certificate_key: CertificateKey,
    pub status: PackageSignatureStatus,
}

impl PackageSignature {
    pub fn new(
        key: SignatureKey,
        package_key: PackageKey,
        certificate_key: CertificateKey,
    ) -> Self {
        Self {
            key,
            package_key,
            certificate_key,
            status: PackageSignatureStatus::Valid,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.status == PackageSignatureStatus::Invalid
    }
}

/// A counter-signature anchoring a package signature in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedTimestamp {
    pub key: TimestampKey,
    /// Signature this timestamp anchors
    pub signature_key: SignatureKey,
    /// Timestamping certificate that counter-signed
    pub certificate_key: CertificateKey,
    pub value: DateTime<Utc>,
}

impl TrustedTimestamp {
    pub fn new(
        key: TimestampKey,
        signature_key: SignatureKey,
        certificate_key: CertificateKey,
        value: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            signature_key,
            certificate_key,
            value,
        }
    }
}

/// Aggregate signing state of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSigningState {
    pub package_key: PackageKey,
    pub signing_status: PackageSigningStatus,
}

impl PackageSigningState {
    pub fn new(package_key: PackageKey, signing_status: PackageSigningStatus) -> Self {
        Self {
            package_key,
            signing_status,
        }
    }
}
