// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use verifier::{ArtifactEncoding, OracleBackend, SessionConfig};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/attestation-verifier/verifier.toml";
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_BASELINE_PATH: &str = "pcr_values.json";
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

/// Environment variables prefixed with this override the config file, e.g.
/// `VERIFIER_ORACLE__TIMEOUT_SECS=10`.
const ENV_PREFIX: &str = "VERIFIER";

#[derive(Debug, Deserialize)]
pub struct VerifierServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Expected register values, loaded once at startup
    #[serde(default = "default_baseline_path")]
    pub baseline_path: PathBuf,

    /// Parent of the per-session scratch directories
    #[serde(default = "std::env::temp_dir")]
    pub scratch_dir: PathBuf,

    #[serde(default)]
    pub artifact_encoding: ArtifactEncoding,

    #[serde(default)]
    pub oracle: OracleConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OracleConfig {
    #[serde(default)]
    pub backend: OracleBackend,

    #[serde(default = "default_checkquote_path")]
    pub checkquote_path: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::default(),
            checkquote_path: default_checkquote_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_baseline_path() -> PathBuf {
    PathBuf::from(DEFAULT_BASELINE_PATH)
}

fn default_checkquote_path() -> String {
    verifier::oracle::DEFAULT_CHECKQUOTE_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_ORACLE_TIMEOUT_SECS
}

impl VerifierServerConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            scratch_dir: self.scratch_dir.clone(),
            oracle_timeout: Duration::from_secs(self.oracle.timeout_secs),
            artifact_encoding: self.artifact_encoding,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.oracle.timeout_secs == 0 {
            bail!("oracle.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

pub fn load_config(path: &str) -> Result<VerifierServerConfig> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::with_name(path).required(false))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context(format!("failed to load verifier config: {}", path))?;

    let cfg: VerifierServerConfig = settings
        .try_deserialize()
        .context("failed to deserialize verifier config")?;
    cfg.validate()?;

    Ok(cfg)
}
