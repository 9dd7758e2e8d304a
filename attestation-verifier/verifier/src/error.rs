// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::path::PathBuf;

use thiserror::Error;

use crate::scratch::Artifact;

pub type Result<T> = std::result::Result<T, Error>;

/// Verifier error types.
///
/// Only the baseline variants are fatal, and only at startup. Everything a
/// session can hit is turned into a failed [`crate::Verdict`] whose reason is
/// the `Display` text of the variant.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read baseline document {path}: {source}")]
    BaselineRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse baseline document: {0}")]
    BaselineParse(#[from] serde_json::Error),

    #[error("failed to stage scratch space")]
    ScratchSpace(#[source] std::io::Error),

    #[error("failed to stage {artifact}")]
    Staging {
        artifact: Artifact,
        #[source]
        source: anyhow::Error,
    },

    /// The oracle ran and rejected the quote. The diagnostic is forwarded as is.
    #[error("{0}")]
    OracleRejected(String),

    #[error("verification timed out")]
    OracleTimeout,

    #[error("verification oracle failed: {0:#}")]
    OracleFault(anyhow::Error),

    #[error("register {index} mismatch: expected {expected}, got {observed}")]
    RegisterMismatch {
        index: String,
        expected: String,
        observed: String,
    },
}
