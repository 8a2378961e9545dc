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

//! Configuration discovery and environment substitution.

use gatehouse::{ConfigError, GatehouseConfig};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "GATEHOUSE_CONFIG";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported configuration format: .{extension} (expected .toml)")]
    UnsupportedFormat { extension: String },

    #[error("Environment substitution failed: {0}")]
    EnvSubstitution(String),

    #[error("Invalid configuration in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Search `./gatehouse.toml`, the user config directory, then
    /// `/etc/gatehouse/config.toml`.
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("./gatehouse.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("gatehouse").join("config.toml"));
        }
        search_paths.push(PathBuf::from("/etc/gatehouse/config.toml"));
        Self { search_paths }
    }

    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Load from an explicit path, `GATEHOUSE_CONFIG`, or the first search
    /// path that exists. Built-in defaults apply when nothing is found.
    pub fn load(
        &self,
        explicit: Option<&Path>,
    ) -> Result<(GatehouseConfig, ConfigSource), LoadError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(|| self.find_config_file()),
        };

        match path {
            Some(path) => {
                let config = self.load_from_file(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            None => Ok((GatehouseConfig::default(), ConfigSource::Defaults)),
        }
    }

    pub fn load_from_file(&self, path: &Path) -> Result<GatehouseConfig, LoadError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") | None => {}
            Some(other) => {
                return Err(LoadError::UnsupportedFormat {
                    extension: other.to_string(),
                })
            }
        }

        let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = substitute_env_vars(&content)?;

        GatehouseConfig::from_toml_str(&content).map_err(|source| LoadError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|path| path.is_file()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `${VAR}`, `${VAR:-default}` and `${VAR:?message}`.
fn substitute_env_vars(content: &str) -> Result<String, LoadError> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| LoadError::EnvSubstitution(e.to_string()))?;

    let mut output = String::with_capacity(content.len());
    let mut last = 0;
    for cap in re.captures_iter(content) {
        let (Some(whole), Some(expr)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        output.push_str(&content[last..whole.start()]);
        output.push_str(&expand(expr.as_str())?);
        last = whole.end();
    }
    output.push_str(&content[last..]);
    Ok(output)
}

fn expand(expr: &str) -> Result<String, LoadError> {
    if let Some((name, default)) = expr.split_once(":-") {
        return Ok(env::var(name).unwrap_or_else(|_| default.to_string()));
    }
    if let Some((name, message)) = expr.split_once(":?") {
        return env::var(name).map_err(|_| {
            LoadError::EnvSubstitution(format!(
                "Required environment variable '{}' is not set: {}",
                name, message
            ))
        });
    }
    env::var(expr).map_err(|_| {
        LoadError::EnvSubstitution(format!(
            "Required environment variable '{}' is not set",
            expr
        ))
    })
}
