// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};

use crate::error::{Error, Result};

/// Expected register values configured by the administrator.
///
/// The document is a JSON object mapping register index strings to expected
/// value strings, e.g. `{"0": "ab12", "7": "cd34"}`. Both sides are kept as
/// opaque strings. Iteration is sorted by register index so that the first
/// reported mismatch is reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Baseline {
    registers: BTreeMap<String, String>,
}

impl Baseline {
    /// Load the baseline document once at startup.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::BaselineRead {
            path: path.to_path_buf(),
            source,
        })?;
        let baseline = Self::from_str(&content)?;

        if baseline.is_empty() {
            warn!(
                "Baseline {} enforces no registers, every register report will match",
                path.display()
            );
        } else {
            info!(
                "Loaded baseline {} enforcing {} register(s)",
                path.display(),
                baseline.len()
            );
        }

        Ok(baseline)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn get(&self, index: &str) -> Option<&str> {
        self.registers.get(index).map(String::as_str)
    }

    /// Enforced registers in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.registers
            .iter()
            .map(|(index, value)| (index.as_str(), value.as_str()))
    }
}

impl FromStr for Baseline {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let registers: BTreeMap<String, String> = serde_json::from_str(s)?;
        Ok(Self { registers })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Baseline {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            registers: iter
                .into_iter()
                .map(|(index, value)| (index.into(), value.into()))
                .collect(),
        }
    }
}
