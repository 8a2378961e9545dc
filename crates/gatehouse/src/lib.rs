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

//! # Gatehouse
//!
//! Release gatekeeping for a package registry.
//!
//! Gatehouse decides, from the outcomes of independently executed
//! validators, whether a submitted package becomes publicly available. It
//! also keeps the certificate trust graph consistent: code-signing
//! certificates, the signatures they produced, and the trusted timestamps
//! that anchor those signatures in time.
//!
//! ## Components
//!
//! - [`policy`]: merges validator configuration with persisted validations
//! - [`reconciler`]: computes package status, publishes with rollback, and
//!   schedules re-checks
//! - [`trust`]: applies certificate verification results and cascades
//!   invalidation to dependent signatures
//! - [`traits`]: the boundary contracts for storage, queues, notification
//!   and telemetry
//! - [`registry`]: an in-memory registry with JSON snapshots
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatehouse::{GatehouseConfig, PolicySnapshot, ValidationOutcomeReconciler};
//!
//! let config = GatehouseConfig::from_toml_str(&std::fs::read_to_string("gatehouse.toml")?)?;
//! let policy = PolicySnapshot::from_config(&config)?;
//!
//! let reconciler =
//!     ValidationOutcomeReconciler::new(registry, files, scheduler, notifier, telemetry);
//! let outcome = reconciler.handle_message(&policy, &message).await?;
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod reconciler;
pub mod registry;
pub mod telemetry;
pub mod time;
pub mod traits;
pub mod trust;

pub use config::{
    CertificateConfig, ConfigError, ConfigValidationError, FailureBehavior, GatehouseConfig,
    ValidationConfig, ValidatorConfig,
};
pub use error::{NotifierError, RegistryError, SchedulerError, StorageError};
pub use models::*;
pub use policy::{PolicyResolver, PolicySnapshot, ResolvedValidation, ValidatorPolicy};
pub use reconciler::{
    ReconcileError, ReconcileOutcome, SetClassification, Transition, ValidationOutcomeReconciler,
};
pub use registry::{MemoryRegistry, RegistrySnapshot};
pub use telemetry::MetricsTelemetry;
pub use time::{Clock, FixedClock, SystemClock};
pub use traits::{
    CertificateRegistry, Notifier, PackageFileStore, RecheckScheduler, Telemetry,
    ValidationRegistry,
};
pub use trust::{CascadeRule, TrustChangeSet, TrustError, TrustGraph, TrustPropagator};
