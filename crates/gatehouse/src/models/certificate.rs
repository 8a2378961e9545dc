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

//! Domain models for end certificates and their validation attempts.
//!
//! End certificates are the leaf certificates used either to sign packages
//! or to counter-sign trusted timestamps. Their status is only ever changed
//! by the trust propagator, one verification result at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Database key of an end certificate.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CertificateKey(pub i64);

impl fmt::Display for CertificateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trust status of an end certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndCertificateStatus {
    /// Not yet resolved by any verification.
    #[default]
    Unknown,
    Good,
    Invalid,
    Revoked,
}

impl EndCertificateStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndCertificateStatus::Unknown => "unknown",
            EndCertificateStatus::Good => "good",
            EndCertificateStatus::Invalid => "invalid",
            EndCertificateStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for EndCertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model for a code-signing or timestamping certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndCertificate {
    pub key: CertificateKey,
    /// SHA256 hex thumbprint of the certificate
    pub thumbprint: String,
    #[serde(default)]
    pub status: EndCertificateStatus,
    /// Consecutive verifications that came back indeterminate
    #[serde(default)]
    pub validation_failures: u32,
    /// None until a revocation has been observed
    #[serde(default)]
    pub revocation_time: Option<DateTime<Utc>>,
}

impl EndCertificate {
    pub fn new(key: CertificateKey, thumbprint: impl Into<String>) -> Self {
        Self {
            key,
            thumbprint: thumbprint.into(),
            status: EndCertificateStatus::Unknown,
            validation_failures: 0,
            revocation_time: None,
        }
    }
}

/// One outstanding verification request for one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateValidationAttempt {
    pub validation_id: Uuid,
    pub certificate_key: CertificateKey,
    /// None while the attempt is still pending
    #[serde(default)]
    pub status: Option<EndCertificateStatus>,
}

impl CertificateValidationAttempt {
    pub fn new(certificate_key: CertificateKey, validation_id: Uuid) -> Self {
        Self {
            validation_id,
            certificate_key,
            status: None,
        }
    }

    /// Check if this attempt is still waiting for a result.
    pub fn is_pending(&self) -> bool {
        self.status.is_none()
    }
}

/// Outcome of checking one certificate's revocation and validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CertificateVerificationResult {
    Good,
    Invalid,
    Revoked { revocation_time: DateTime<Utc> },
    /// The check could not reach a verdict.
    Unknown,
}

impl CertificateVerificationResult {
    /// The certificate status this result maps to.
    pub fn status(&self) -> EndCertificateStatus {
        match self {
            CertificateVerificationResult::Good => EndCertificateStatus::Good,
            CertificateVerificationResult::Invalid => EndCertificateStatus::Invalid,
            CertificateVerificationResult::Revoked { .. } => EndCertificateStatus::Revoked,
            CertificateVerificationResult::Unknown => EndCertificateStatus::Unknown,
        }
    }
}

impl fmt::Display for CertificateVerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateVerificationResult::Revoked { revocation_time } => {
                write!(f, "revoked at {}", revocation_time.to_rfc3339())
            }
            other => write!(f, "{}", other.status()),
        }
    }
}
