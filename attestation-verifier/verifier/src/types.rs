// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Evidence bundle submitted by an attesting device.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AttestationRequest {
    // TPMS_ATTEST quote body
    pub message: String,
    // Signature over `message` made with the attestation key
    pub signature: String,
    // Freshness token that must be bound into the quote
    pub nonce: String,
    // Attestation public key
    pub pubkey: String,
    // Newline-delimited "<index> <value>" pairs
    pub pcr_values: String,
}

/// Outcome of one verification session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub reason: String,
}

impl Verdict {
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

impl From<Error> for Verdict {
    fn from(e: Error) -> Self {
        Self::fail(e.to_string())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, strum::Display)]
pub enum Status {
    #[serde(rename = "OK")]
    #[strum(serialize = "OK")]
    Ok,
    #[serde(rename = "FAIL")]
    #[strum(serialize = "FAIL")]
    Fail,
}

/// Wire response returned to the caller of the verification endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerifyResponse {
    pub status: Status,
    pub message: String,
}

impl From<Verdict> for VerifyResponse {
    fn from(verdict: Verdict) -> Self {
        let status = match verdict.valid {
            true => Status::Ok,
            false => Status::Fail,
        };
        Self {
            status,
            message: verdict.reason,
        }
    }
}
