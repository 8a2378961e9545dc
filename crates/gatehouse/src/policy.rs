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

//! Validator policy resolution.
//!
//! A [`PolicySnapshot`] is the immutable, validated form of the validator
//! configuration. It is handed to each reconciliation explicitly. The
//! [`PolicyResolver`] pairs every *persisted* validation of a set with the
//! policy for its validator name; validators that are configured but have
//! not recorded a validation yet are not considered.

use crate::config::{ConfigError, FailureBehavior, GatehouseConfig, MAX_RECHECK_PERIOD_SECS};
use crate::models::{PackageValidation, ValidationSet, ValidationStatus};
use chrono::Duration;
use std::collections::HashMap;
use tracing::warn;

/// Behavior and recheck metadata for one validator name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorPolicy {
    pub required: bool,
    pub failure_behavior: FailureBehavior,
    pub recheck_period: Duration,
}

impl ValidatorPolicy {
    pub fn must_succeed(recheck_period: Duration) -> Self {
        Self {
            required: true,
            failure_behavior: FailureBehavior::MustSucceed,
            recheck_period,
        }
    }

    pub fn allowed_to_fail(recheck_period: Duration) -> Self {
        Self {
            required: true,
            failure_behavior: FailureBehavior::AllowedToFail,
            recheck_period,
        }
    }
}

/// Immutable view of validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySnapshot {
    validators: HashMap<String, ValidatorPolicy>,
    default_recheck_period: Duration,
    max_validation_failures: u32,
}

impl PolicySnapshot {
    pub fn new(default_recheck_period: Duration, max_validation_failures: u32) -> Self {
        Self {
            validators: HashMap::new(),
            default_recheck_period,
            max_validation_failures,
        }
    }

    /// Adds or replaces the policy for a validator name.
    pub fn with_validator(mut self, name: impl Into<String>, policy: ValidatorPolicy) -> Self {
        self.validators.insert(name.into(), policy);
        self
    }

    /// Validates the configuration and captures it as a snapshot.
    pub fn from_config(config: &GatehouseConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let default_recheck_period = seconds(config.validation.recheck_period_secs);
        let mut snapshot = Self::new(
            default_recheck_period,
            config.certificates.maximum_validation_failures,
        );
        for validator in &config.validation.validators {
            let policy = ValidatorPolicy {
                required: validator.required,
                failure_behavior: validator.failure_behavior,
                recheck_period: validator
                    .recheck_period_secs
                    .map(seconds)
                    .unwrap_or(default_recheck_period),
            };
            snapshot.validators.insert(validator.name.clone(), policy);
        }
        Ok(snapshot)
    }

    pub fn get(&self, name: &str) -> Option<&ValidatorPolicy> {
        self.validators.get(name)
    }

    pub fn default_recheck_period(&self) -> Duration {
        self.default_recheck_period
    }

    pub fn max_validation_failures(&self) -> u32 {
        self.max_validation_failures
    }

    /// Configured validators ordered by name.
    pub fn validators(&self) -> Vec<(&str, &ValidatorPolicy)> {
        let mut validators: Vec<_> = self
            .validators
            .iter()
            .map(|(name, policy)| (name.as_str(), policy))
            .collect();
        validators.sort_by(|a, b| a.0.cmp(b.0));
        validators
    }
}

fn seconds(secs: u64) -> Duration {
    // Bounded by validation; the clamp keeps the conversion total.
    Duration::seconds(secs.min(MAX_RECHECK_PERIOD_SECS) as i64)
}

/// A persisted validation paired with the policy that governs it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedValidation<'a> {
    pub validation: &'a PackageValidation,
    pub policy: ValidatorPolicy,
}

impl ResolvedValidation<'_> {
    pub fn status(&self) -> ValidationStatus {
        self.validation.status
    }

    /// Failed under a policy that does not tolerate failure.
    pub fn is_hard_failure(&self) -> bool {
        self.validation.status == ValidationStatus::Failed
            && self.policy.failure_behavior == FailureBehavior::MustSucceed
    }

    /// Still waiting on the validator.
    pub fn is_pending(&self) -> bool {
        matches!(
            self.validation.status,
            ValidationStatus::NotStarted | ValidationStatus::Incomplete
        )
    }
}

/// Merges a [`PolicySnapshot`] with the validations of a set.
#[derive(Debug, Clone, Copy)]
pub struct PolicyResolver<'p> {
    snapshot: &'p PolicySnapshot,
}

impl<'p> PolicyResolver<'p> {
    pub fn new(snapshot: &'p PolicySnapshot) -> Self {
        Self { snapshot }
    }

    /// Resolve one policy per persisted validation, in set order.
    ///
    /// A validator name missing from configuration is treated as
    /// `MustSucceed` with the default recheck period.
    pub fn resolve<'s>(&self, set: &'s ValidationSet) -> Vec<ResolvedValidation<'s>> {
        set.validations
            .iter()
            .map(|validation| {
                let policy = match self.snapshot.get(&validation.validator) {
                    Some(policy) => *policy,
                    None => {
                        warn!(
                            validation_tracking_id = %set.tracking_id,
                            validator = %validation.validator,
                            "No policy configured for validator, treating it as must-succeed"
                        );
                        ValidatorPolicy::must_succeed(self.snapshot.default_recheck_period)
                    }
                };
                ResolvedValidation { validation, policy }
            })
            .collect()
    }
}
