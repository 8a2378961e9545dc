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

//! Implementation of the `check-config` command.

use crate::config_loader::ConfigSource;
use anyhow::{Context, Result};
use gatehouse::{FailureBehavior, GatehouseConfig, PolicySnapshot};
use std::fmt::Write;

/// Render the effective configuration and the per-validator policies.
pub fn render(config: &GatehouseConfig, source: &ConfigSource) -> Result<String> {
    let policy = PolicySnapshot::from_config(config).context("Configuration is invalid")?;

    let mut out = String::new();
    match source {
        ConfigSource::File(path) => writeln!(out, "# source: {}", path.display())?,
        ConfigSource::Defaults => writeln!(out, "# source: built-in defaults")?,
    }
    out.push_str(&toml::to_string_pretty(config).context("Failed to render configuration")?);

    writeln!(out)?;
    writeln!(
        out,
        "# default re-check period: {}s, certificate failure threshold: {}",
        policy.default_recheck_period().num_seconds(),
        policy.max_validation_failures()
    )?;
    for (name, validator) in policy.validators() {
        let behavior = match validator.failure_behavior {
            FailureBehavior::MustSucceed => "must succeed",
            FailureBehavior::AllowedToFail => "allowed to fail",
        };
        writeln!(
            out,
            "# {}: {}, {}, re-check every {}s",
            name,
            if validator.required { "required" } else { "optional" },
            behavior,
            validator.recheck_period.num_seconds()
        )?;
    }
    Ok(out)
}

pub fn run(config: &GatehouseConfig, source: &ConfigSource) -> Result<()> {
    print!("{}", render(config, source)?);
    Ok(())
}
