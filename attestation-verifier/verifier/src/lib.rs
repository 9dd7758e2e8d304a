// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Remote attestation verifier for TPM quotes.
//!
//! A caller submits a quote (`message`), its `signature`, the freshness
//! `nonce`, the attestation public key and the register values it claims.
//! [`Verifier::verify`] decides whether
//! - the quote is signed by that key over that nonce, as judged by a pluggable
//!   [`QuoteOracle`], and
//! - the claimed registers agree with the administrator's [`Baseline`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use verifier::{new_oracle, AttestationRequest, Baseline, OracleBackend, SessionConfig, Verifier};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let baseline = Arc::new(Baseline::from_file("pcr_values.json")?);
//! let oracle = new_oracle(OracleBackend::Tpm2Tools, "tpm2_checkquote")?;
//! let verifier = Verifier::new(baseline, oracle, SessionConfig::default());
//!
//! let verdict = verifier.verify(&AttestationRequest::default()).await;
//! println!("{}: {}", verdict.valid, verdict.reason);
//! # Ok(())
//! # }
//! ```

pub mod baseline;
pub mod error;
pub mod oracle;
pub mod registers;
pub mod scratch;
pub mod session;
pub mod types;

pub use baseline::Baseline;
pub use error::{Error, Result};
pub use oracle::{new_oracle, BoxedOracle, OracleBackend, OracleOutcome, QuoteOracle};
pub use registers::{compare, RegisterReport};
pub use scratch::{Artifact, ArtifactEncoding, StagedArtifacts};
pub use session::{SessionConfig, Verifier, DEFAULT_ORACLE_TIMEOUT};
pub use types::{AttestationRequest, Status, Verdict, VerifyResponse};
