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

//! gatehousectl - replay validation outcomes and certificate results
//! against a registry snapshot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

mod adapters;
mod commands;
mod config_loader;
mod metrics_export;

use commands::certificate::ResultArg;
use config_loader::{ConfigLoader, ConfigSource};
use gatehouse::GatehouseConfig;

/// Gatehouse - package validation and certificate trust reconciliation
#[derive(Parser)]
#[command(name = "gatehousectl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (can also be set via GATEHOUSE_CONFIG)
    #[arg(long, env = "GATEHOUSE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write recorded metrics (Prometheus text format) to this file on exit
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a package's status with its validation set
    Reconcile {
        /// Registry snapshot (JSON), updated in place
        #[arg(long)]
        snapshot: PathBuf,

        /// Validation tracking id of the set to reconcile
        #[arg(long)]
        tracking_id: Uuid,

        /// Directory holding packages under validation
        #[arg(long, default_value = "./validation")]
        validation_dir: PathBuf,

        /// Directory holding published packages
        #[arg(long, default_value = "./public")]
        public_dir: PathBuf,
    },

    /// Save a certificate verification result and cascade it to signatures
    Certificate {
        /// Registry snapshot (JSON), updated in place
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        certificate_key: i64,

        /// Id of the pending validation attempt
        #[arg(long)]
        attempt_id: Uuid,

        #[arg(long, value_enum)]
        result: ResultArg,

        /// Revocation time (RFC 3339), required with `--result revoked`
        #[arg(long)]
        revoked_at: Option<String>,
    },

    /// Validate the configuration and print the resolved validator policies
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let metrics = metrics_export::install()?;

    let (config, source) = ConfigLoader::new()
        .load(cli.config.as_deref())
        .context("Failed to load gatehouse configuration")?;
    match &source {
        ConfigSource::File(path) => debug!(path = %path.display(), "Loaded configuration"),
        ConfigSource::Defaults => debug!("No configuration file found, using defaults"),
    }

    let result = run(cli.command, &config, &source).await;

    if let Some(path) = &cli.metrics_out {
        metrics_export::write(&metrics, path).await?;
    }

    result
}

async fn run(command: Commands, config: &GatehouseConfig, source: &ConfigSource) -> Result<()> {
    match command {
        Commands::Reconcile {
            snapshot,
            tracking_id,
            validation_dir,
            public_dir,
        } => {
            let args = commands::reconcile::ReconcileArgs {
                snapshot,
                tracking_id,
                validation_dir,
                public_dir,
            };
            commands::reconcile::run(config, &args).await?;
        }
        Commands::Certificate {
            snapshot,
            certificate_key,
            attempt_id,
            result,
            revoked_at,
        } => {
            let args = commands::certificate::CertificateArgs {
                snapshot,
                certificate_key,
                attempt_id,
                result,
                revoked_at,
            };
            commands::certificate::run(config, &args).await?;
        }
        Commands::CheckConfig => {
            commands::check_config::run(config, source)?;
        }
    }

    Ok(())
}
