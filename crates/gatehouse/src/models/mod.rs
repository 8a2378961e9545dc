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

//! Domain models shared by the reconciler and the trust propagator.
//!
//! These are API-level types; registry backends handle storage.

pub mod certificate;
pub mod message;
pub mod package;
pub mod signature;
pub mod validation;

pub use certificate::{
    CertificateKey, CertificateValidationAttempt, CertificateVerificationResult, EndCertificate,
    EndCertificateStatus,
};
pub use message::{CertificateValidationMessage, PackageValidationMessage};
pub use package::{Package, PackageKey, PackageStatus};
pub use signature::{
    PackageSignature, PackageSignatureStatus, PackageSigningState, PackageSigningStatus,
    SignatureKey, TimestampKey, TrustedTimestamp,
};
pub use validation::{PackageValidation, ValidationIssueCode, ValidationSet, ValidationStatus};
