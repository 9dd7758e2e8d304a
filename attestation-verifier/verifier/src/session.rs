// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::FutureExt;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::baseline::Baseline;
use crate::error::{Error, Result};
use crate::oracle::BoxedOracle;
use crate::registers::{RegisterReport, REGISTERS_MATCH};
use crate::scratch::{ArtifactEncoding, StagedArtifacts};
use crate::types::{AttestationRequest, Verdict};

pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every session of a [`Verifier`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Parent directory of the per-session scratch directories
    pub scratch_dir: PathBuf,

    /// Upper bound for one oracle call
    pub oracle_timeout: Duration,

    pub artifact_encoding: ArtifactEncoding,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            artifact_encoding: ArtifactEncoding::default(),
        }
    }
}

/// Attestation verification engine.
///
/// Cloning is cheap and every clone shares the same read-only baseline and
/// oracle. [`Verifier::verify`] may run concurrently from any number of tasks:
/// each call stages its artifacts into a scratch directory nobody else can
/// name, so sessions cannot observe each other.
#[derive(Clone)]
pub struct Verifier {
    baseline: Arc<Baseline>,
    oracle: BoxedOracle,
    config: Arc<SessionConfig>,
}

impl Verifier {
    pub fn new(baseline: Arc<Baseline>, oracle: BoxedOracle, config: SessionConfig) -> Self {
        Self {
            baseline,
            oracle,
            config: Arc::new(config),
        }
    }

    /// Run one verification session. Always yields a verdict.
    pub async fn verify(&self, request: &AttestationRequest) -> Verdict {
        let session_id = Uuid::new_v4();
        debug!("Session {session_id}: started");

        let verdict = match self.run(session_id, request).await {
            Ok(()) => Verdict::pass(REGISTERS_MATCH),
            Err(e) => {
                warn!("Session {session_id}: verification failed: {e}");
                Verdict::from(e)
            }
        };

        info!(
            "Session {session_id}: {} ({})",
            if verdict.valid { "OK" } else { "FAIL" },
            verdict.reason
        );
        verdict
    }

    async fn run(&self, session_id: Uuid, request: &AttestationRequest) -> Result<()> {
        // Dropping `artifacts` removes the scratch directory, so every early
        // return below and a cancelled or panicking oracle call still clean up.
        let artifacts = StagedArtifacts::stage(
            &self.config.scratch_dir,
            session_id,
            request,
            self.config.artifact_encoding,
        )
        .await?;

        debug!("Session {session_id}: artifacts staged, calling oracle");
        let checked = tokio::time::timeout(
            self.config.oracle_timeout,
            AssertUnwindSafe(self.oracle.check(&artifacts)).catch_unwind(),
        )
        .await;
        artifacts.release();

        let outcome = checked
            .map_err(|_| Error::OracleTimeout)?
            .map_err(|panic| {
                Error::OracleFault(anyhow!("oracle panicked: {}", panic_message(&*panic)))
            })?
            .map_err(Error::OracleFault)?;
        if !outcome.valid {
            return Err(Error::OracleRejected(outcome.diagnostic));
        }

        debug!("Session {session_id}: quote verified, checking registers");
        RegisterReport::parse(&request.pcr_values).check(&self.baseline)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
