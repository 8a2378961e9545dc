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

//! Certificate trust propagation.
//!
//! [`TrustPropagator`] applies one verification result to one certificate:
//!
//! - `Good` resets the failure counter and clears any revocation time.
//! - `Invalid` invalidates every tied signature, regardless of time.
//! - `Revoked` invalidates tied signatures anchored strictly after the
//!   revocation instant.
//! - `Unknown` counts a failure. Reaching the configured maximum flags the
//!   certificate `Invalid` and raises an alert every time, but does not touch any
//!   signature: indeterminate evidence alone never takes a package down.
//!
//! Every mutation for one result goes out in a single
//! [`CertificateRegistry::commit`]. Telemetry is emitted only after that
//! commit succeeds.

mod graph;

pub use graph::{CascadeRule, TrustChangeSet, TrustGraph};

use crate::error::RegistryError;
use crate::models::{
    CertificateKey, CertificateValidationAttempt, CertificateValidationMessage,
    CertificateVerificationResult, EndCertificate, EndCertificateStatus,
};
use crate::telemetry::events;
use crate::traits::{CertificateRegistry, Telemetry};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while saving a verification result.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to commit verification result for certificate {certificate}: {source}")]
    Commit {
        certificate: CertificateKey,
        #[source]
        source: RegistryError,
    },
}

/// Applies certificate verification results to the trust graph.
pub struct TrustPropagator {
    registry: Arc<dyn CertificateRegistry>,
    telemetry: Arc<dyn Telemetry>,
    max_validation_failures: u32,
}

impl TrustPropagator {
    pub fn new(
        registry: Arc<dyn CertificateRegistry>,
        telemetry: Arc<dyn Telemetry>,
        max_validation_failures: u32,
    ) -> Self {
        Self {
            registry,
            telemetry,
            max_validation_failures,
        }
    }

    /// Find the pending attempt a message refers to.
    ///
    /// Returns `None` when no attempt matches both the certificate key and
    /// the validation id, or when the attempt already has a result.
    pub async fn find_certificate_validation(
        &self,
        message: &CertificateValidationMessage,
    ) -> Result<Option<CertificateValidationAttempt>, TrustError> {
        Ok(self
            .registry
            .find_pending_attempt(message.certificate_key, message.validation_id)
            .await?)
    }

    /// Save a verification result and cascade it.
    ///
    /// Returns `Ok(false)` without mutating anything when the attempt or its
    /// certificate cannot be resolved.
    pub async fn try_save_result(
        &self,
        message: &CertificateValidationMessage,
        result: CertificateVerificationResult,
    ) -> Result<bool, TrustError> {
        let Some(attempt) = self.find_certificate_validation(message).await? else {
            warn!(
                certificate_key = %message.certificate_key,
                validation_id = %message.validation_id,
                "No pending certificate validation found"
            );
            return Ok(false);
        };

        let Some(certificate) = self.registry.get_certificate(attempt.certificate_key).await?
        else {
            warn!(
                certificate_key = %attempt.certificate_key,
                validation_id = %attempt.validation_id,
                "Certificate validation refers to an unknown certificate"
            );
            return Ok(false);
        };

        let (changes, alert) = self.plan(certificate, attempt, result).await?;

        self.registry
            .commit(&changes)
            .await
            .map_err(|source| TrustError::Commit {
                certificate: changes.certificate.key,
                source,
            })?;

        info!(
            event_type = events::CERTIFICATE_RESULT_SAVED,
            certificate_key = %changes.certificate.key,
            validation_id = %changes.attempt.validation_id,
            result = %result,
            status = %changes.certificate.status,
            validation_failures = changes.certificate.validation_failures,
            invalidated_signatures = changes.invalidated_signatures.len(),
            "Saved certificate verification result"
        );

        if alert {
            self.telemetry.record_certificate_alert(&changes.certificate);
        }
        for signature in &changes.invalidated_signatures {
            self.telemetry.record_signature_invalidated(signature);
        }

        Ok(true)
    }

    /// Build the change set for a result. The flag is true when the
    /// unable-to-validate alert must fire.
    async fn plan(
        &self,
        mut certificate: EndCertificate,
        mut attempt: CertificateValidationAttempt,
        result: CertificateVerificationResult,
    ) -> Result<(TrustChangeSet, bool), TrustError> {
        let mut alert = false;
        let mut cascade = None;

        match result {
            CertificateVerificationResult::Good => {
                certificate.status = EndCertificateStatus::Good;
                certificate.validation_failures = 0;
                certificate.revocation_time = None;
                attempt.status = Some(EndCertificateStatus::Good);
            }
            CertificateVerificationResult::Invalid => {
                certificate.status = EndCertificateStatus::Invalid;
                attempt.status = Some(EndCertificateStatus::Invalid);
                cascade = Some(CascadeRule::Unconditional);
            }
            CertificateVerificationResult::Revoked { revocation_time } => {
                certificate.status = EndCertificateStatus::Revoked;
                certificate.revocation_time = Some(revocation_time);
                attempt.status = Some(EndCertificateStatus::Revoked);
                cascade = Some(CascadeRule::RevokedAt(revocation_time));
            }
            CertificateVerificationResult::Unknown => {
                certificate.validation_failures = certificate.validation_failures.saturating_add(1);
                if certificate.validation_failures >= self.max_validation_failures {
                    alert = true;
                    certificate.status = EndCertificateStatus::Invalid;
                    attempt.status = Some(EndCertificateStatus::Invalid);
                } else {
                    debug!(
                        certificate_key = %certificate.key,
                        validation_failures = certificate.validation_failures,
                        max_validation_failures = self.max_validation_failures,
                        "Certificate verification was indeterminate"
                    );
                }
            }
        }

        let (invalidated_signatures, signing_states) = match cascade {
            Some(rule) => {
                let graph = self.registry.load_trust_graph(certificate.key).await?;
                graph.cascade(certificate.key, rule)
            }
            None => (Vec::new(), Vec::new()),
        };

        Ok((
            TrustChangeSet {
                certificate,
                attempt,
                invalidated_signatures,
                signing_states,
            },
            alert,
        ))
    }
}
