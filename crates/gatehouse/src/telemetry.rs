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

//! Structured events and the `metrics`-backed [`Telemetry`] adapter.
//!
//! Every log line that records a state change carries an `event_type` field
//! from [`events`] so that downstream collectors can filter on it.

use crate::models::{EndCertificate, PackageSignature, PackageStatus};
use crate::traits::Telemetry;
use chrono::Duration;

/// Event types for package and certificate operations.
pub mod events {
    /// Package status changed.
    pub const PACKAGE_STATUS_CHANGED: &str = "package.status.changed";
    /// Package copied to public storage and marked available.
    pub const PACKAGE_PUBLISHED: &str = "package.published";
    /// Public copy removed after a failed status update.
    pub const PACKAGE_PUBLISH_ROLLBACK: &str = "package.publish.rollback";
    /// Public copy could not be removed after a failed status update.
    pub const PACKAGE_PUBLISH_ROLLBACK_FAILED: &str = "package.publish.rollback_failed";
    /// Validation copy could not be removed after promotion.
    pub const PACKAGE_CLEANUP_FAILED: &str = "package.cleanup.failed";
    /// Re-check of a validation set scheduled.
    pub const VALIDATION_RECHECK_SCHEDULED: &str = "validation.recheck.scheduled";
    /// Owner notification could not be delivered.
    pub const NOTIFICATION_FAILED: &str = "notification.failed";
    /// Total reconciliation duration recorded.
    pub const VALIDATION_DURATION: &str = "validation.duration";

    /// Verification result stored for a certificate.
    pub const CERTIFICATE_RESULT_SAVED: &str = "certificate.result.saved";
    /// Certificate could not be validated too many times in a row.
    pub const CERTIFICATE_ALERT_UNABLE_TO_VALIDATE: &str = "certificate.alert.unable_to_validate";
    /// Signature invalidated by a certificate cascade.
    pub const SIGNATURE_INVALIDATED: &str = "signature.invalidated";
}

/// Metric names published by [`MetricsTelemetry`].
pub mod metric_names {
    pub const TOTAL_DURATION: &str = "gatehouse_validation_total_duration_seconds";
    pub const STATUS_CHANGES: &str = "gatehouse_package_status_changes_total";
    pub const CERTIFICATE_ALERTS: &str = "gatehouse_certificate_alerts_total";
    pub const SIGNATURES_INVALIDATED: &str = "gatehouse_signatures_invalidated_total";
}

/// Records through the `metrics` facade; whatever recorder the process
/// installs receives the values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsTelemetry;

impl MetricsTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl Telemetry for MetricsTelemetry {
    fn record_total_duration(&self, duration: Duration, succeeded: bool) {
        let seconds = duration.num_milliseconds() as f64 / 1000.0;
        metrics::histogram!(
            metric_names::TOTAL_DURATION,
            "succeeded" => if succeeded { "true" } else { "false" }
        )
        .record(seconds);
        tracing::debug!(
            event_type = events::VALIDATION_DURATION,
            seconds,
            succeeded,
            "Validation duration recorded"
        );
    }

    fn record_status_change(&self, from: PackageStatus, to: PackageStatus) {
        metrics::counter!(
            metric_names::STATUS_CHANGES,
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
    }

    fn record_certificate_alert(&self, certificate: &EndCertificate) {
        metrics::counter!(metric_names::CERTIFICATE_ALERTS).increment(1);
        tracing::error!(
            event_type = events::CERTIFICATE_ALERT_UNABLE_TO_VALIDATE,
            certificate_key = %certificate.key,
            thumbprint = %certificate.thumbprint,
            validation_failures = certificate.validation_failures,
            "Unable to validate certificate"
        );
    }

    fn record_signature_invalidated(&self, signature: &PackageSignature) {
        metrics::counter!(metric_names::SIGNATURES_INVALIDATED).increment(1);
        tracing::warn!(
            event_type = events::SIGNATURE_INVALIDATED,
            signature_key = %signature.key,
            package_key = %signature.package_key,
            certificate_key = %signature.certificate_key,
            "Package signature should be invalidated"
        );
    }
}
