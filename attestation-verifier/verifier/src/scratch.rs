// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Per-session scratch space for the quote artifacts.
//!
//! Every session stages its message, signature, nonce and public key into a
//! freshly created private directory whose name carries the session id. Two
//! sessions therefore never share a path, and the directory is removed when
//! the [`StagedArtifacts`] value is dropped, whichever way the session ends.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use base64::Engine;
use log::{debug, warn};
use serde::Deserialize;
use tempfile::TempDir;
use tokio::{fs::File, io::AsyncWriteExt};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::AttestationRequest;

const SCRATCH_PREFIX: &str = "attest-";

const QUOTE_MESSAGE_FILE: &str = "quote_message.dat";
const QUOTE_SIGNATURE_FILE: &str = "quote_signature.dat";
const NONCE_FILE: &str = "nonce.txt";
const ATTESTATION_KEY_FILE: &str = "attestation_key.pub";

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum Artifact {
    #[strum(serialize = "message")]
    Message,
    #[strum(serialize = "signature")]
    Signature,
    #[strum(serialize = "nonce")]
    Nonce,
    #[strum(serialize = "public key")]
    PublicKey,
}

impl Artifact {
    fn file_name(&self) -> &'static str {
        match self {
            Artifact::Message => QUOTE_MESSAGE_FILE,
            Artifact::Signature => QUOTE_SIGNATURE_FILE,
            Artifact::Nonce => NONCE_FILE,
            Artifact::PublicKey => ATTESTATION_KEY_FILE,
        }
    }
}

/// How the string fields of a request map to artifact bytes.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ArtifactEncoding {
    /// Stage the UTF-8 bytes of each field.
    #[default]
    Raw,
    /// Base64-decode message, signature and public key. The nonce is staged raw.
    Base64,
}

impl ArtifactEncoding {
    fn decode(&self, artifact: Artifact, value: &str) -> anyhow::Result<Vec<u8>> {
        match (self, artifact) {
            (ArtifactEncoding::Raw, _) | (ArtifactEncoding::Base64, Artifact::Nonce) => {
                Ok(value.as_bytes().to_vec())
            }
            (ArtifactEncoding::Base64, _) => base64::engine::general_purpose::STANDARD
                .decode(value.trim())
                .map_err(|e| anyhow!("invalid base64: {e}")),
        }
    }
}

/// The staged artifacts of one session. Owns its directory exclusively.
#[derive(Debug)]
pub struct StagedArtifacts {
    session_id: Uuid,
    dir: TempDir,
}

impl StagedArtifacts {
    /// Create an empty scratch directory for `session_id` under `scratch_root`.
    pub fn create(scratch_root: &Path, session_id: Uuid) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{SCRATCH_PREFIX}{session_id}-"))
            .tempdir_in(scratch_root)
            .map_err(Error::ScratchSpace)?;
        debug!(
            "Session {session_id}: scratch space at {}",
            dir.path().display()
        );

        Ok(Self { session_id, dir })
    }

    /// Create the scratch directory and write the request artifacts into it.
    pub async fn stage(
        scratch_root: &Path,
        session_id: Uuid,
        request: &AttestationRequest,
        encoding: ArtifactEncoding,
    ) -> Result<Self> {
        let staged = Self::create(scratch_root, session_id)?;
        for (artifact, value) in [
            (Artifact::Message, &request.message),
            (Artifact::Signature, &request.signature),
            (Artifact::Nonce, &request.nonce),
            (Artifact::PublicKey, &request.pubkey),
        ] {
            staged
                .write(artifact, value, encoding)
                .await
                .map_err(|source| Error::Staging { artifact, source })?;
        }

        Ok(staged)
    }

    async fn write(
        &self,
        artifact: Artifact,
        value: &str,
        encoding: ArtifactEncoding,
    ) -> anyhow::Result<()> {
        let bytes = encoding.decode(artifact, value)?;
        let path = self.path(artifact);
        let mut file = File::create(&path)
            .await
            .with_context(|| format!("create {}", path.display()))?;
        file.write_all(&bytes)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flush {}", path.display()))?;

        Ok(())
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.path().join(artifact.file_name())
    }

    pub async fn read(&self, artifact: Artifact) -> anyhow::Result<Vec<u8>> {
        let path = self.path(artifact);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("read staged {artifact} {}", path.display()))
    }

    /// Remove the scratch directory, reporting removal errors. Dropping the
    /// value removes it too, silently.
    pub fn release(self) {
        let session_id = self.session_id;
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Session {session_id}: released scratch space"),
            Err(e) => warn!(
                "Session {session_id}: failed to remove scratch space {}: {e}",
                path.display()
            ),
        }
    }
}
