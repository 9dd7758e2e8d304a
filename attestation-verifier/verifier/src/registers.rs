// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::collections::HashMap;

use crate::baseline::Baseline;
use crate::error::{Error, Result};

pub const REGISTERS_MATCH: &str = "registers match baseline";

/// Register values reported alongside a quote.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RegisterReport {
    registers: HashMap<String, String>,
}

impl RegisterReport {
    /// Parse a newline-delimited `<index> <value>` report.
    ///
    /// Lines that do not split into exactly two whitespace separated tokens
    /// are skipped. A repeated index keeps the last value.
    pub fn parse(report: &str) -> Self {
        let registers = report
            .lines()
            .filter_map(|line| {
                let mut tokens = line.split_whitespace();
                match (tokens.next(), tokens.next(), tokens.next()) {
                    (Some(index), Some(value), None) => Some((index.to_string(), value.to_string())),
                    _ => None,
                }
            })
            .collect();

        Self { registers }
    }

    pub fn get(&self, index: &str) -> Option<&str> {
        self.registers.get(index).map(String::as_str)
    }

    /// Check every baseline register against the report, stopping at the
    /// first one that is absent or differs. Registers the baseline does not
    /// name are not checked.
    pub fn check(&self, baseline: &Baseline) -> Result<()> {
        for (index, expected) in baseline.iter() {
            let observed = self.get(index);
            if observed != Some(expected) {
                return Err(Error::RegisterMismatch {
                    index: index.to_string(),
                    expected: expected.to_string(),
                    observed: observed.unwrap_or_default().to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Compare a raw register report with the baseline.
pub fn compare(report: &str, baseline: &Baseline) -> (bool, String) {
    match RegisterReport::parse(report).check(baseline) {
        Ok(()) => (true, REGISTERS_MATCH.to_string()),
        Err(e) => (false, e.to_string()),
    }
}
