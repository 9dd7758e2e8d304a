// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::{OracleOutcome, QuoteOracle};
use crate::scratch::{Artifact, StagedArtifacts};

mod structures;

use structures::{parse_quote_attest, parse_signature, QuoteSignature};

pub const QUOTE_VERIFIED: &str = "quote signature and nonce verified";

/// Verifies RSA-signed TPM quotes in-process.
///
/// The signature is checked over the SHA-256 digest of the staged message
/// with the staged public key, then the quote's `extraData` must carry the
/// staged nonce, either byte for byte or as the hex-decoded nonce.
#[derive(Debug, Default, Clone)]
pub struct NativeRsaOracle {}

#[async_trait::async_trait]
impl QuoteOracle for NativeRsaOracle {
    async fn check(&self, artifacts: &StagedArtifacts) -> Result<OracleOutcome> {
        let message = artifacts.read(Artifact::Message).await?;
        let signature = artifacts.read(Artifact::Signature).await?;
        let nonce = artifacts.read(Artifact::Nonce).await?;
        let pubkey = artifacts.read(Artifact::PublicKey).await?;

        let session_id = artifacts.session_id();
        let outcome = tokio::task::spawn_blocking(move || {
            verify_quote(&message, &signature, &nonce, &pubkey)
        })
        .await
        .map_err(|e| anyhow!("native quote verification task failed: {e}"))?;

        if outcome.valid {
            debug!("Session {session_id}: {}", outcome.diagnostic);
        } else {
            warn!("Session {session_id}: quote rejected: {}", outcome.diagnostic);
        }

        Ok(outcome)
    }
}

fn verify_quote(message: &[u8], signature: &[u8], nonce: &[u8], pubkey: &[u8]) -> OracleOutcome {
    let key = match load_public_key(pubkey) {
        Ok(key) => key,
        Err(e) => return OracleOutcome::invalid(format!("invalid public key: {e:#}")),
    };

    let signature = match parse_signature(signature) {
        Ok(signature) => signature,
        Err(e) => return OracleOutcome::invalid(format!("invalid signature: {e:#}")),
    };

    let digest = Sha256::digest(message);
    let verified = match signature {
        QuoteSignature::RsaSsa(sig) => key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, sig),
        QuoteSignature::RsaPss(sig) => key.verify(Pss::new::<Sha256>(), &digest, sig),
    };
    if verified.is_err() {
        return OracleOutcome::invalid("signature mismatch");
    }

    let attest = match parse_quote_attest(message) {
        Ok(attest) => attest,
        Err(e) => return OracleOutcome::invalid(format!("malformed quote: {e:#}")),
    };

    if !nonce_matches(attest.extra_data, nonce) {
        return OracleOutcome::invalid("nonce mismatch");
    }

    OracleOutcome::valid(QUOTE_VERIFIED)
}

fn nonce_matches(extra_data: &[u8], nonce: &[u8]) -> bool {
    if extra_data == nonce {
        return true;
    }

    std::str::from_utf8(nonce)
        .ok()
        .and_then(|nonce| hex::decode(nonce.trim()).ok())
        .is_some_and(|decoded| decoded == extra_data)
}

fn load_public_key(pubkey: &[u8]) -> Result<RsaPublicKey> {
    match std::str::from_utf8(pubkey) {
        Ok(pem) if pem.contains("-----BEGIN") => RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .context("unsupported PEM public key"),
        _ => RsaPublicKey::from_public_key_der(pubkey)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(pubkey))
            .context("unsupported DER public key"),
    }
}
