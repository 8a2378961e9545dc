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

//! Verification results applied to certificates and dependent signatures.

use super::{signature, valid_state, TrustHarness, CERT1, CERT2, MAX_FAILURES, PACKAGE};
use crate::fixtures::now;
use chrono::Duration;
use gatehouse::{
    CertificateValidationAttempt, CertificateValidationMessage, CertificateVerificationResult,
    EndCertificateStatus, PackageKey, PackageSignature, PackageSignatureStatus,
    PackageSigningStatus, RegistrySnapshot, SignatureKey, TimestampKey, TrustError,
    TrustedTimestamp,
};
use std::sync::atomic::Ordering;
use tracing_test::traced_test;
use uuid::Uuid;

fn timestamp(
    key: i64,
    signature: i64,
    issuer: gatehouse::CertificateKey,
    value: chrono::DateTime<chrono::Utc>,
) -> TrustedTimestamp {
    TrustedTimestamp::new(TimestampKey(key), SignatureKey(signature), issuer, value)
}

/// sig1 uses cert1, sig2 uses cert2 with a cert1 timestamp, sig3 uses
/// cert2 with a cert2 timestamp.
fn invalid_fixture() -> RegistrySnapshot {
    RegistrySnapshot::new()
        .with_signature(signature(1, CERT1))
        .with_signature(signature(2, CERT2))
        .with_signature(signature(3, CERT2))
        .with_timestamp(timestamp(10, 1, CERT2, now()))
        .with_timestamp(timestamp(11, 2, CERT1, now()))
        .with_timestamp(timestamp(12, 3, CERT2, now()))
        .with_signing_state(valid_state(PACKAGE))
}

#[tokio::test]
async fn test_good_result_resets_certificate() {
    let harness = TrustHarness::new(invalid_fixture());

    let saved = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Good)
        .await
        .unwrap();

    assert!(saved);
    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Good);
    assert_eq!(certificate.validation_failures, 0);
    assert_eq!(certificate.revocation_time, None);
    assert_eq!(harness.attempt().await.status, Some(EndCertificateStatus::Good));
    assert_eq!(harness.signature_status(1).await, PackageSignatureStatus::Valid);
    assert!(harness.telemetry.alerts().is_empty());
    assert!(harness.telemetry.invalidated().is_empty());
    assert_eq!(harness.commits(), 1);
}

#[tokio::test]
async fn test_good_result_clears_revocation_time() {
    let harness = TrustHarness::with_certificate(RegistrySnapshot::new(), |certificate| {
        certificate.status = EndCertificateStatus::Revoked;
        certificate.revocation_time = Some(now());
    });

    harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Good)
        .await
        .unwrap();

    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Good);
    assert_eq!(certificate.revocation_time, None);
}

#[tokio::test]
async fn test_invalid_result_invalidates_dependent_signatures() {
    let harness = TrustHarness::new(invalid_fixture());

    let saved = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await
        .unwrap();

    assert!(saved);
    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Invalid);
    assert_eq!(certificate.validation_failures, 3);
    assert_eq!(certificate.revocation_time, None);
    assert_eq!(harness.attempt().await.status, Some(EndCertificateStatus::Invalid));

    assert_eq!(harness.signature_status(1).await, PackageSignatureStatus::Invalid);
    assert_eq!(harness.signature_status(2).await, PackageSignatureStatus::Invalid);
    assert_eq!(harness.signature_status(3).await, PackageSignatureStatus::Valid);
    assert_eq!(
        harness.signing_status(PACKAGE).await,
        Some(PackageSigningStatus::Invalid)
    );

    assert!(harness.telemetry.alerts().is_empty());
    assert_eq!(
        harness.telemetry.invalidated(),
        vec![SignatureKey(1), SignatureKey(2)]
    );
    assert_eq!(harness.commits(), 1);
}

#[tokio::test]
async fn test_revoked_result_invalidates_signatures_after_revocation() {
    let revoked_at = now();
    let before = revoked_at - Duration::days(1);
    let after = revoked_at + Duration::days(1);
    let harness = TrustHarness::new(
        RegistrySnapshot::new()
            .with_signature(signature(12, CERT1))
            .with_signature(signature(23, CERT1))
            .with_signature(signature(34, CERT2))
            .with_signature(signature(45, CERT2))
            .with_timestamp(timestamp(1, 12, CERT2, before))
            .with_timestamp(timestamp(2, 23, CERT2, after))
            .with_timestamp(timestamp(3, 34, CERT1, after))
            .with_timestamp(timestamp(4, 45, CERT2, before))
            .with_signing_state(valid_state(PACKAGE)),
    );

    let saved = harness
        .propagator
        .try_save_result(
            &harness.message,
            CertificateVerificationResult::Revoked {
                revocation_time: revoked_at,
            },
        )
        .await
        .unwrap();

    assert!(saved);
    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Revoked);
    assert_eq!(certificate.revocation_time, Some(revoked_at));
    assert_eq!(certificate.validation_failures, 3);
    assert_eq!(harness.attempt().await.status, Some(EndCertificateStatus::Revoked));

    assert_eq!(harness.signature_status(12).await, PackageSignatureStatus::Valid);
    assert_eq!(harness.signature_status(23).await, PackageSignatureStatus::Invalid);
    assert_eq!(harness.signature_status(34).await, PackageSignatureStatus::Invalid);
    assert_eq!(harness.signature_status(45).await, PackageSignatureStatus::Valid);
    assert_eq!(
        harness.signing_status(PACKAGE).await,
        Some(PackageSigningStatus::Invalid)
    );

    assert!(harness.telemetry.alerts().is_empty());
    assert_eq!(harness.telemetry.invalidated().len(), 2);
    assert_eq!(harness.commits(), 1);
}

#[tokio::test]
async fn test_revoked_result_spares_signature_timestamped_at_revocation() {
    let revoked_at = now();
    let harness = TrustHarness::new(
        RegistrySnapshot::new()
            .with_signature(signature(1, CERT1))
            .with_timestamp(timestamp(1, 1, CERT1, revoked_at))
            .with_signing_state(valid_state(PACKAGE)),
    );

    let saved = harness
        .propagator
        .try_save_result(
            &harness.message,
            CertificateVerificationResult::Revoked {
                revocation_time: revoked_at,
            },
        )
        .await
        .unwrap();

    assert!(saved);
    assert_eq!(
        harness.certificate(CERT1).await.status,
        EndCertificateStatus::Revoked
    );
    assert_eq!(harness.signature_status(1).await, PackageSignatureStatus::Valid);
    assert_eq!(
        harness.signing_status(PACKAGE).await,
        Some(PackageSigningStatus::Valid)
    );
    assert!(harness.telemetry.invalidated().is_empty());
}

#[tokio::test]
async fn test_signing_state_of_untouched_package_is_unchanged() {
    let other = PackageKey(2);
    let harness = TrustHarness::new(
        RegistrySnapshot::new()
            .with_signature(signature(1, CERT1))
            .with_signature(PackageSignature::new(SignatureKey(2), other, CERT2))
            .with_signing_state(valid_state(PACKAGE))
            .with_signing_state(valid_state(other)),
    );

    harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await
        .unwrap();

    assert_eq!(
        harness.signing_status(PACKAGE).await,
        Some(PackageSigningStatus::Invalid)
    );
    assert_eq!(
        harness.signing_status(other).await,
        Some(PackageSigningStatus::Valid)
    );
}

#[tokio::test]
async fn test_unknown_result_counts_failure() {
    let harness = TrustHarness::new(invalid_fixture());

    let saved = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Unknown)
        .await
        .unwrap();

    assert!(saved);
    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Unknown);
    assert_eq!(certificate.validation_failures, 4);
    assert_eq!(certificate.revocation_time, None);
    assert_eq!(harness.attempt().await.status, None);
    assert!(harness.telemetry.alerts().is_empty());
    assert!(harness.telemetry.invalidated().is_empty());
    assert_eq!(harness.commits(), 1);
}

#[tokio::test]
async fn test_unknown_result_alerts_at_threshold_without_cascade() {
    let harness = TrustHarness::new(invalid_fixture());

    harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Unknown)
        .await
        .unwrap();
    let saved = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Unknown)
        .await
        .unwrap();

    assert!(saved);
    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Invalid);
    assert_eq!(certificate.validation_failures, 5);
    assert_eq!(certificate.revocation_time, None);
    assert_eq!(harness.attempt().await.status, Some(EndCertificateStatus::Invalid));

    assert_eq!(harness.telemetry.alerts(), vec![CERT1]);
    assert!(harness.telemetry.invalidated().is_empty());
    assert_eq!(harness.signature_status(1).await, PackageSignatureStatus::Valid);
    assert_eq!(harness.signature_status(2).await, PackageSignatureStatus::Valid);
    assert_eq!(
        harness.signing_status(PACKAGE).await,
        Some(PackageSigningStatus::Valid)
    );
    assert_eq!(harness.commits(), 2);
}

#[tokio::test]
async fn test_unknown_escalation_on_invalid_certificate_alerts() {
    let harness = TrustHarness::with_certificate(RegistrySnapshot::new(), |certificate| {
        certificate.status = EndCertificateStatus::Invalid;
        certificate.validation_failures = MAX_FAILURES - 1;
    });

    harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Unknown)
        .await
        .unwrap();

    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Invalid);
    assert_eq!(certificate.validation_failures, MAX_FAILURES);
    assert_eq!(harness.attempt().await.status, Some(EndCertificateStatus::Invalid));
    assert_eq!(harness.telemetry.alerts(), vec![CERT1]);
    assert!(harness.telemetry.invalidated().is_empty());
}

#[tokio::test]
async fn test_unknown_below_threshold_keeps_good_status() {
    let harness = TrustHarness::with_certificate(RegistrySnapshot::new(), |certificate| {
        certificate.status = EndCertificateStatus::Good;
        certificate.validation_failures = 0;
    });

    harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Unknown)
        .await
        .unwrap();

    let certificate = harness.certificate(CERT1).await;
    assert_eq!(certificate.status, EndCertificateStatus::Good);
    assert_eq!(certificate.validation_failures, 1);
    assert_eq!(harness.attempt().await.status, None);
}

#[tokio::test]
async fn test_repeated_invalid_result_is_idempotent() {
    let harness = TrustHarness::new(invalid_fixture());
    harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await
        .unwrap();

    let mut snapshot = harness.registry.inner.snapshot().await;
    let second = Uuid::new_v4();
    snapshot
        .certificate_validations
        .push(CertificateValidationAttempt::new(CERT1, second));
    let harness = TrustHarness::with_snapshot_and_message(
        snapshot,
        CertificateValidationMessage::new(CERT1, second),
    );

    let saved = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await
        .unwrap();

    assert!(saved);
    assert!(harness.telemetry.invalidated().is_empty());
    assert_eq!(harness.signature_status(1).await, PackageSignatureStatus::Invalid);
    assert_eq!(harness.signature_status(3).await, PackageSignatureStatus::Valid);
}

#[tokio::test]
async fn test_resolved_attempt_is_not_saved_twice() {
    let harness = TrustHarness::new(invalid_fixture());
    harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await
        .unwrap();

    let saved = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await
        .unwrap();

    assert!(!saved);
    assert_eq!(harness.commits(), 1);
    assert_eq!(harness.telemetry.invalidated().len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_unknown_attempt_is_not_saved() {
    let harness = TrustHarness::new(invalid_fixture());
    let message = CertificateValidationMessage::new(CERT1, Uuid::new_v4());

    assert_eq!(
        harness
            .propagator
            .find_certificate_validation(&message)
            .await
            .unwrap(),
        None
    );
    let saved = harness
        .propagator
        .try_save_result(&message, CertificateVerificationResult::Good)
        .await
        .unwrap();

    assert!(!saved);
    assert_eq!(harness.commits(), 0);
    assert!(logs_contain("No pending certificate validation found"));
}

#[tokio::test]
async fn test_attempt_for_other_certificate_is_not_found() {
    let harness = TrustHarness::new(invalid_fixture());
    let message = CertificateValidationMessage::new(CERT2, harness.message.validation_id);

    let found = harness
        .propagator
        .find_certificate_validation(&message)
        .await
        .unwrap();

    assert_eq!(found, None);
}

#[tokio::test]
async fn test_attempt_with_missing_certificate_is_not_saved() {
    let mut snapshot = RegistrySnapshot::new();
    let validation_id = Uuid::new_v4();
    snapshot
        .certificate_validations
        .push(CertificateValidationAttempt::new(CERT1, validation_id));
    let harness = TrustHarness::with_snapshot_and_message(
        snapshot,
        CertificateValidationMessage::new(CERT1, validation_id),
    );

    let saved = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await
        .unwrap();

    assert!(!saved);
    assert_eq!(harness.commits(), 0);
}

#[tokio::test]
async fn test_commit_failure_leaves_graph_untouched() {
    let harness = TrustHarness::new(invalid_fixture());
    harness.registry.fail_commit.store(true, Ordering::SeqCst);

    let result = harness
        .propagator
        .try_save_result(&harness.message, CertificateVerificationResult::Invalid)
        .await;

    assert!(matches!(result, Err(TrustError::Commit { certificate, .. }) if certificate == CERT1));
    assert_eq!(harness.certificate(CERT1).await.status, EndCertificateStatus::Unknown);
    assert_eq!(harness.signature_status(1).await, PackageSignatureStatus::Valid);
    assert_eq!(harness.attempt().await.status, None);
    assert!(harness.telemetry.invalidated().is_empty());
}
