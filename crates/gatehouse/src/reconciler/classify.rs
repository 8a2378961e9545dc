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

//! Pure decision functions: set classification and status transitions.

use crate::models::{PackageStatus, ValidationStatus};
use crate::policy::ResolvedValidation;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate state of a validation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetClassification {
    /// Every persisted validation succeeded (and there is at least one).
    AllSucceeded,
    /// At least one must-succeed validation failed.
    HardFailed,
    /// Anything else, including only tolerated failures.
    Pending,
}

impl SetClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetClassification::AllSucceeded => "all_succeeded",
            SetClassification::HardFailed => "hard_failed",
            SetClassification::Pending => "pending",
        }
    }
}

impl fmt::Display for SetClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the reconciler does for a given status and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Run the publish sequence and become `Available`.
    Promote,
    /// Become `FailedValidation` and notify the owner.
    Reject,
    /// Stay `Validating` and schedule a re-check.
    AwaitRecheck,
    /// Nothing to do.
    Unchanged,
}

pub fn classify(resolved: &[ResolvedValidation<'_>]) -> SetClassification {
    if resolved.iter().any(ResolvedValidation::is_hard_failure) {
        SetClassification::HardFailed
    } else if !resolved.is_empty()
        && resolved
            .iter()
            .all(|item| item.status() == ValidationStatus::Succeeded)
    {
        SetClassification::AllSucceeded
    } else {
        SetClassification::Pending
    }
}

/// Transition table. `Available` is sticky.
pub fn next_transition(current: PackageStatus, classification: SetClassification) -> Transition {
    use PackageStatus::*;
    use SetClassification::*;

    match (current, classification) {
        (Available, _) => Transition::Unchanged,
        (Validating, AllSucceeded) | (FailedValidation, AllSucceeded) => Transition::Promote,
        (Validating, HardFailed) => Transition::Reject,
        (Validating, Pending) => Transition::AwaitRecheck,
        (FailedValidation, HardFailed) | (FailedValidation, Pending) => Transition::Unchanged,
    }
}

/// Shortest recheck period among validations still in flight, or `default`
/// when none is.
pub fn recheck_period(resolved: &[ResolvedValidation<'_>], default: Duration) -> Duration {
    resolved
        .iter()
        .filter(|item| item.is_pending())
        .map(|item| item.policy.recheck_period)
        .min()
        .unwrap_or(default)
}
