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

//! Configuration types for validators and certificate checks.
//!
//! The configuration is plain serde data read from TOML:
//!
//! ```toml
//! [validation]
//! recheck_period_secs = 60
//!
//! [[validation.validators]]
//! name = "PackageSigningValidator"
//! failure_behavior = "must_succeed"
//!
//! [[validation.validators]]
//! name = "VirusScanValidator"
//! failure_behavior = "allowed_to_fail"
//! recheck_period_secs = 300
//! required_validations = ["PackageSigningValidator"]
//!
//! [certificates]
//! maximum_validation_failures = 5
//! ```
//!
//! [`GatehouseConfig::validate`] must pass before a configuration is turned
//! into a [`PolicySnapshot`](crate::policy::PolicySnapshot).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Upper bound for any recheck period (one week).
pub const MAX_RECHECK_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

const DEFAULT_RECHECK_PERIOD_SECS: u64 = 60;
const DEFAULT_MAXIMUM_VALIDATION_FAILURES: u32 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ConfigValidationError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error(
        "Invalid recheck period for {scope}: {secs}s (must be between 1 and {max})",
        max = MAX_RECHECK_PERIOD_SECS
    )]
    InvalidRecheckPeriod { scope: String, secs: u64 },

    #[error("Validator name must not be empty")]
    EmptyValidatorName,

    #[error("Validator configured more than once: {name}")]
    DuplicateValidator { name: String },

    #[error("Validator {validator} requires unknown validator {required}")]
    UnknownRequiredValidation { validator: String, required: String },

    #[error("Validator {validator} requires {required}, which is not started (required = false)")]
    PrerequisiteNotStarted { validator: String, required: String },

    #[error("Validator dependency cycle involving {name}")]
    DependencyCycle { name: String },

    #[error("maximum_validation_failures must be at least 1")]
    InvalidMaximumValidationFailures,

    #[error("Multiple validation errors: {errors:?}")]
    Multiple { errors: Vec<ConfigValidationError> },
}

/// What a validator's failure means for the package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureBehavior {
    /// A failure rejects the package.
    #[default]
    MustSucceed,
    /// A failure is recorded but does not reject the package.
    AllowedToFail,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatehouseConfig {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub certificates: CertificateConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Recheck period used by validators without their own
    #[serde(default = "default_recheck_period_secs")]
    pub recheck_period_secs: u64,
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            recheck_period_secs: DEFAULT_RECHECK_PERIOD_SECS,
            validators: Vec::new(),
        }
    }
}

/// Configuration item for one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub name: String,
    /// Whether the orchestrator starts this validator at all
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub failure_behavior: FailureBehavior,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recheck_period_secs: Option<u64>,
    /// Validators that must finish before this one starts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_validations: Vec<String>,
}

impl ValidatorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            failure_behavior: FailureBehavior::MustSucceed,
            recheck_period_secs: None,
            required_validations: Vec::new(),
        }
    }

    pub fn with_failure_behavior(mut self, value: FailureBehavior) -> Self {
        self.failure_behavior = value;
        self
    }

    pub fn with_recheck_period_secs(mut self, value: u64) -> Self {
        self.recheck_period_secs = Some(value);
        self
    }

    pub fn with_required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    /// Adds a prerequisite validator.
    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.required_validations.push(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// Indeterminate results tolerated before a certificate is flagged
    #[serde(default = "default_maximum_validation_failures")]
    pub maximum_validation_failures: u32,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            maximum_validation_failures: DEFAULT_MAXIMUM_VALIDATION_FAILURES,
        }
    }
}

fn default_recheck_period_secs() -> u64 {
    DEFAULT_RECHECK_PERIOD_SECS
}

fn default_required() -> bool {
    true
}

fn default_maximum_validation_failures() -> u32 {
    DEFAULT_MAXIMUM_VALIDATION_FAILURES
}

impl GatehouseConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GatehouseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration, reporting every problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut errors = Vec::new();

        check_recheck_period("validation", self.validation.recheck_period_secs, &mut errors);

        let mut by_name: HashMap<&str, &ValidatorConfig> = HashMap::new();
        for validator in &self.validation.validators {
            if validator.name.trim().is_empty() {
                errors.push(ConfigValidationError::EmptyValidatorName);
                continue;
            }
            if by_name.insert(validator.name.as_str(), validator).is_some() {
                errors.push(ConfigValidationError::DuplicateValidator {
                    name: validator.name.clone(),
                });
            }
            if let Some(secs) = validator.recheck_period_secs {
                check_recheck_period(&validator.name, secs, &mut errors);
            }
        }

        for validator in &self.validation.validators {
            for required in &validator.required_validations {
                match by_name.get(required.as_str()) {
                    None => errors.push(ConfigValidationError::UnknownRequiredValidation {
                        validator: validator.name.clone(),
                        required: required.clone(),
                    }),
                    Some(prerequisite) if !prerequisite.required => {
                        errors.push(ConfigValidationError::PrerequisiteNotStarted {
                            validator: validator.name.clone(),
                            required: required.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        if let Some(name) = find_cycle(&by_name) {
            errors.push(ConfigValidationError::DependencyCycle { name });
        }

        if self.certificates.maximum_validation_failures == 0 {
            errors.push(ConfigValidationError::InvalidMaximumValidationFailures);
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigValidationError::Multiple { errors }),
        }
    }
}

fn check_recheck_period(scope: &str, secs: u64, errors: &mut Vec<ConfigValidationError>) {
    if secs == 0 || secs > MAX_RECHECK_PERIOD_SECS {
        errors.push(ConfigValidationError::InvalidRecheckPeriod {
            scope: scope.to_string(),
            secs,
        });
    }
}

/// Depth-first search over `required_validations`; returns a validator on a
/// cycle if one exists. Unknown names are reported elsewhere and skipped.
fn find_cycle(by_name: &HashMap<&str, &ValidatorConfig>) -> Option<String> {
    fn visit<'a>(
        name: &'a str,
        by_name: &HashMap<&'a str, &'a ValidatorConfig>,
        in_progress: &mut HashSet<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Option<String> {
        if done.contains(name) {
            return None;
        }
        if !in_progress.insert(name) {
            return Some(name.to_string());
        }
        if let Some(validator) = by_name.get(name) {
            for required in &validator.required_validations {
                if let Some(cycle) = visit(required.as_str(), by_name, in_progress, done) {
                    return Some(cycle);
                }
            }
        }
        in_progress.remove(name);
        done.insert(name);
        None
    }

    let mut names: Vec<&str> = by_name.keys().copied().collect();
    names.sort_unstable();

    let mut in_progress = HashSet::new();
    let mut done = HashSet::new();
    names
        .into_iter()
        .find_map(|name| visit(name, by_name, &mut in_progress, &mut done))
}
