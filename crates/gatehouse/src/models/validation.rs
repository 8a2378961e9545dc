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

//! Domain models for validation sets.
//!
//! A [`ValidationSet`] groups every validator run that belongs to one
//! submission attempt. Validators update their own [`PackageValidation`]
//! rows; this crate only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Status of a single validator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    NotStarted,
    Incomplete,
    Succeeded,
    Failed,
}

impl ValidationStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::NotStarted => "not_started",
            ValidationStatus::Incomplete => "incomplete",
            ValidationStatus::Succeeded => "succeeded",
            ValidationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue codes a validator may attach to its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationIssueCode {
    Unknown,
    /// The package carries a signature the registry does not accept.
    PackageIsSigned,
}

/// One validator's run against a validation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageValidation {
    pub id: Uuid,
    /// Validator name, matched against configured validator policies
    pub validator: String,
    pub status: ValidationStatus,
    #[serde(default)]
    pub issues: Vec<ValidationIssueCode>,
}

impl PackageValidation {
    pub fn new(validator: impl Into<String>, status: ValidationStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            validator: validator.into(),
            status,
            issues: Vec::new(),
        }
    }

    /// Attaches issue codes to the validation.
    pub fn with_issues(mut self, issues: impl IntoIterator<Item = ValidationIssueCode>) -> Self {
        self.issues = issues.into_iter().collect();
        self
    }

    /// True when the only reported issue is that the package is signed.
    ///
    /// An empty issue list does not count.
    pub fn failed_only_because_signed(&self) -> bool {
        !self.issues.is_empty()
            && self
                .issues
                .iter()
                .all(|code| *code == ValidationIssueCode::PackageIsSigned)
    }
}

/// The group of validations for one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSet {
    pub tracking_id: Uuid,
    pub package_id: String,
    pub package_normalized_version: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub validations: Vec<PackageValidation>,
}

impl ValidationSet {
    pub fn new(
        package_id: impl Into<String>,
        package_normalized_version: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            tracking_id: Uuid::new_v4(),
            package_id: package_id.into(),
            package_normalized_version: package_normalized_version.into(),
            created,
            validations: Vec::new(),
        }
    }

    /// Appends a validation to the set.
    pub fn with_validation(mut self, validation: PackageValidation) -> Self {
        self.validations.push(validation);
        self
    }
}
