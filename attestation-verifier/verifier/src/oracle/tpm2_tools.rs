// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::process::Stdio;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::process::Command;

use super::{OracleOutcome, QuoteOracle};
use crate::scratch::{Artifact, StagedArtifacts};

/// Checks quotes with `tpm2_checkquote`.
///
/// The tool reads the staged files of the calling session only. If the
/// session future is dropped (timeout) the child process is killed.
#[derive(Debug, Clone)]
pub struct Tpm2ToolsOracle {
    checkquote_path: String,
}

impl Tpm2ToolsOracle {
    pub fn new(checkquote_path: impl Into<String>) -> Self {
        Self {
            checkquote_path: checkquote_path.into(),
        }
    }
}

impl Default for Tpm2ToolsOracle {
    fn default() -> Self {
        Self::new(super::DEFAULT_CHECKQUOTE_PATH)
    }
}

#[async_trait::async_trait]
impl QuoteOracle for Tpm2ToolsOracle {
    async fn check(&self, artifacts: &StagedArtifacts) -> Result<OracleOutcome> {
        let session_id = artifacts.session_id();
        let mut command = Command::new(&self.checkquote_path);
        command
            .arg("--public")
            .arg(artifacts.path(Artifact::PublicKey))
            .arg("--message")
            .arg(artifacts.path(Artifact::Message))
            .arg("--signature")
            .arg(artifacts.path(Artifact::Signature))
            .arg("--qualification")
            .arg(artifacts.path(Artifact::Nonce))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        debug!("Session {session_id}: running {:?}", command.as_std());

        let output = command
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.checkquote_path))?;

        let mut diagnostic = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostic.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(OracleOutcome::valid(diagnostic))
        } else {
            warn!(
                "Session {session_id}: {} failed ({}): {}",
                self.checkquote_path,
                output.status,
                diagnostic.trim_end()
            );
            Ok(OracleOutcome::invalid(diagnostic))
        }
    }
}
