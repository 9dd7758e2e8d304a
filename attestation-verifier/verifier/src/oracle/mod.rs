// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::sync::Arc;

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::scratch::StagedArtifacts;

#[cfg(feature = "native-oracle")]
pub mod native;

#[cfg(feature = "tpm2-tools-oracle")]
pub mod tpm2_tools;

pub const DEFAULT_CHECKQUOTE_PATH: &str = "tpm2_checkquote";

/// Result of checking a quote signature and its nonce binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleOutcome {
    pub valid: bool,
    pub diagnostic: String,
}

impl OracleOutcome {
    pub fn valid(diagnostic: impl Into<String>) -> Self {
        Self {
            valid: true,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn invalid(diagnostic: impl Into<String>) -> Self {
        Self {
            valid: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// A backend able to tell whether a staged quote was signed by the staged
/// attestation key over the staged nonce.
///
/// `Ok(outcome)` is the backend's answer. `Err` means the backend could not
/// produce one at all (tool missing, unreadable artifact, ...).
#[async_trait::async_trait]
pub trait QuoteOracle {
    async fn check(&self, artifacts: &StagedArtifacts) -> Result<OracleOutcome>;
}

pub type BoxedOracle = Arc<dyn QuoteOracle + Send + Sync>;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OracleBackend {
    /// `tpm2_checkquote` from tpm2-tools
    #[default]
    Tpm2Tools,
    /// in-process RSA verification
    Native,
}

/// Build the oracle selected by configuration.
#[allow(unused_variables)]
pub fn new_oracle(backend: OracleBackend, checkquote_path: &str) -> Result<BoxedOracle> {
    match backend {
        #[cfg(feature = "tpm2-tools-oracle")]
        OracleBackend::Tpm2Tools => Ok(Arc::new(tpm2_tools::Tpm2ToolsOracle::new(
            checkquote_path,
        ))),
        #[cfg(feature = "native-oracle")]
        OracleBackend::Native => Ok(Arc::new(native::NativeRsaOracle::default())),
        #[allow(unreachable_patterns)]
        other => bail!("oracle backend {other} is not supported by this build"),
    }
}
