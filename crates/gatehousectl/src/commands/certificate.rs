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

//! Implementation of the `certificate` command.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use gatehouse::{
    CertificateKey, CertificateValidationMessage, CertificateVerificationResult, GatehouseConfig,
    MemoryRegistry, MetricsTelemetry, PolicySnapshot, RegistrySnapshot, TrustPropagator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResultArg {
    Good,
    Invalid,
    Revoked,
    Unknown,
}

pub struct CertificateArgs {
    pub snapshot: PathBuf,
    pub certificate_key: i64,
    pub attempt_id: Uuid,
    pub result: ResultArg,
    pub revoked_at: Option<String>,
}

/// Build the verification result, requiring a revocation time only for
/// `revoked`.
fn verification_result(
    result: ResultArg,
    revoked_at: Option<&str>,
) -> Result<CertificateVerificationResult> {
    match (result, revoked_at) {
        (ResultArg::Revoked, Some(raw)) => {
            let revocation_time = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid revocation time: {}", raw))?
                .with_timezone(&Utc);
            Ok(CertificateVerificationResult::Revoked { revocation_time })
        }
        (ResultArg::Revoked, None) => Err(anyhow!("--revoked-at is required for a revoked result")),
        (_, Some(_)) => Err(anyhow!("--revoked-at only applies to a revoked result")),
        (ResultArg::Good, None) => Ok(CertificateVerificationResult::Good),
        (ResultArg::Invalid, None) => Ok(CertificateVerificationResult::Invalid),
        (ResultArg::Unknown, None) => Ok(CertificateVerificationResult::Unknown),
    }
}

pub async fn run(config: &GatehouseConfig, args: &CertificateArgs) -> Result<()> {
    let policy =
        PolicySnapshot::from_config(config).context("Invalid certificate configuration")?;
    let result = verification_result(args.result, args.revoked_at.as_deref())?;

    let snapshot = RegistrySnapshot::load(&args.snapshot)
        .await
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;
    let registry = Arc::new(MemoryRegistry::from_snapshot(snapshot));

    let propagator = TrustPropagator::new(
        registry.clone(),
        Arc::new(MetricsTelemetry),
        policy.max_validation_failures(),
    );
    let message =
        CertificateValidationMessage::new(CertificateKey(args.certificate_key), args.attempt_id);

    let saved = propagator
        .try_save_result(&message, result)
        .await
        .context("Failed to save certificate result")?;
    if !saved {
        bail!(
            "No pending validation {} for certificate {}",
            args.attempt_id,
            args.certificate_key
        );
    }

    registry
        .snapshot()
        .await
        .save(&args.snapshot)
        .await
        .with_context(|| format!("Failed to save snapshot {}", args.snapshot.display()))?;

    info!(
        certificate_key = args.certificate_key,
        validation_id = %args.attempt_id,
        result = %result,
        "Certificate result applied"
    );
    println!("certificate {}: {}", args.certificate_key, result);
    Ok(())
}
