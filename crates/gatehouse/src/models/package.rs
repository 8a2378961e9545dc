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

//! Domain models for packages under validation.
//!
//! A [`Package`] is one version of a package. Its [`PackageStatus`] is the
//! only piece of package state this crate ever changes, and only the
//! reconciler changes it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database key of a package version.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PackageKey(pub i64);

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Release status of a package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageStatus {
    /// Submitted and waiting on validators.
    Validating,
    /// Publicly available.
    Available,
    /// Rejected by at least one validator that must succeed.
    FailedValidation,
}

impl PackageStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Validating => "validating",
            PackageStatus::Available => "available",
            PackageStatus::FailedValidation => "failed_validation",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model for one package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub key: PackageKey,
    /// Package registration id, e.g. `Newtonsoft.Json`
    pub id: String,
    /// Version exactly as submitted
    pub version: String,
    /// Normalized version used to match validation sets
    pub normalized_version: String,
    pub status: PackageStatus,
}

impl Package {
    /// Creates a package that has just been submitted (`Validating`).
    pub fn new(
        key: PackageKey,
        id: impl Into<String>,
        version: impl Into<String>,
        normalized_version: impl Into<String>,
    ) -> Self {
        Self {
            key,
            id: id.into(),
            version: version.into(),
            normalized_version: normalized_version.into(),
            status: PackageStatus::Validating,
        }
    }

    /// Returns the package with a different status.
    pub fn with_status(mut self, status: PackageStatus) -> Self {
        self.status = status;
        self
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.normalized_version)
    }
}
