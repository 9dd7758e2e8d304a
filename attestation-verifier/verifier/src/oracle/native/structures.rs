// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Just enough of the TPM 2.0 wire structures to find the nonce in a quote
//! and the raw bytes of its signature.

use anyhow::{bail, Context, Result};
use scroll::{Pread, BE};

pub const TPM_GENERATED_VALUE: u32 = 0xff54_4347;
pub const TPM_ST_ATTEST_QUOTE: u16 = 0x8018;

pub const TPM_ALG_RSASSA: u16 = 0x0014;
pub const TPM_ALG_RSAPSS: u16 = 0x0016;
pub const TPM_ALG_SHA256: u16 = 0x000b;

const TPMT_SIGNATURE_HEADER_LEN: usize = 6;

/// Leading fields of a `TPMS_ATTEST`.
#[derive(Debug, PartialEq, Eq)]
pub struct AttestHeader<'a> {
    pub extra_data: &'a [u8],
}

pub fn parse_quote_attest(bytes: &[u8]) -> Result<AttestHeader<'_>> {
    let offset = &mut 0;

    let magic: u32 = bytes.gread_with(offset, BE).context("truncated magic")?;
    if magic != TPM_GENERATED_VALUE {
        bail!("unexpected magic {magic:#010x}");
    }

    let attest_type: u16 = bytes.gread_with(offset, BE).context("truncated type")?;
    if attest_type != TPM_ST_ATTEST_QUOTE {
        bail!("unexpected attestation type {attest_type:#06x}");
    }

    read_tpm2b(bytes, offset).context("truncated qualifiedSigner")?;
    let extra_data = read_tpm2b(bytes, offset).context("truncated extraData")?;

    Ok(AttestHeader { extra_data })
}

fn read_tpm2b<'a>(bytes: &'a [u8], offset: &mut usize) -> Result<&'a [u8]> {
    let size: u16 = bytes.gread_with(offset, BE)?;
    let data: &[u8] = bytes.gread_with(offset, size as usize)?;
    Ok(data)
}

#[derive(Debug, PartialEq, Eq)]
pub enum QuoteSignature<'a> {
    RsaSsa(&'a [u8]),
    RsaPss(&'a [u8]),
}

/// Accept either a marshalled `TPMT_SIGNATURE` or a bare RSASSA signature.
pub fn parse_signature(bytes: &[u8]) -> Result<QuoteSignature<'_>> {
    if bytes.len() < TPMT_SIGNATURE_HEADER_LEN {
        return Ok(QuoteSignature::RsaSsa(bytes));
    }

    let offset = &mut 0;
    let sig_alg: u16 = bytes.gread_with(offset, BE)?;
    let hash_alg: u16 = bytes.gread_with(offset, BE)?;
    let size: u16 = bytes.gread_with(offset, BE)?;

    let is_tpmt = matches!(sig_alg, TPM_ALG_RSASSA | TPM_ALG_RSAPSS)
        && TPMT_SIGNATURE_HEADER_LEN + size as usize == bytes.len();
    if !is_tpmt {
        return Ok(QuoteSignature::RsaSsa(bytes));
    }

    if hash_alg != TPM_ALG_SHA256 {
        bail!("unsupported signature hash algorithm {hash_alg:#06x}");
    }

    let signature = &bytes[TPMT_SIGNATURE_HEADER_LEN..];
    Ok(match sig_alg {
        TPM_ALG_RSAPSS => QuoteSignature::RsaPss(signature),
        _ => QuoteSignature::RsaSsa(signature),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn quote_attest(extra_data: &[u8]) -> Vec<u8> {
        let mut attest = Vec::new();
        attest.extend_from_slice(&TPM_GENERATED_VALUE.to_be_bytes());
        attest.extend_from_slice(&TPM_ST_ATTEST_QUOTE.to_be_bytes());
        attest.extend_from_slice(&4u16.to_be_bytes());
        attest.extend_from_slice(&[0x00, 0x0b, 0xaa, 0xbb]);
        attest.extend_from_slice(&(extra_data.len() as u16).to_be_bytes());
        attest.extend_from_slice(extra_data);
        // clockInfo and the rest of the body are not inspected
        attest.extend_from_slice(&[0u8; 17]);
        attest
    }

    pub(crate) fn tpmt_signature(sig_alg: u16, signature: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&sig_alg.to_be_bytes());
        bytes.extend_from_slice(&TPM_ALG_SHA256.to_be_bytes());
        bytes.extend_from_slice(&(signature.len() as u16).to_be_bytes());
        bytes.extend_from_slice(signature);
        bytes
    }

    #[test]
    fn test_parse_quote_attest() {
        let attest = quote_attest(b"nonce");
        let header = parse_quote_attest(&attest).unwrap();
        assert_eq!(header.extra_data, b"nonce");
    }

    #[test]
    fn test_reject_bad_magic() {
        let mut attest = quote_attest(b"nonce");
        attest[0] = 0;
        let err = parse_quote_attest(&attest).unwrap_err();
        assert!(err.to_string().contains("unexpected magic"));
    }

    #[test]
    fn test_reject_truncated_extra_data() {
        let attest = quote_attest(b"nonce");
        assert!(parse_quote_attest(&attest[..12]).is_err());
    }

    #[test]
    fn test_parse_signature() {
        let raw = [7u8; 16];
        assert_eq!(parse_signature(&raw).unwrap(), QuoteSignature::RsaSsa(&raw));

        let tpmt = tpmt_signature(TPM_ALG_RSAPSS, &raw);
        assert_eq!(parse_signature(&tpmt).unwrap(), QuoteSignature::RsaPss(&raw));

        let tpmt = tpmt_signature(TPM_ALG_RSASSA, &raw);
        assert_eq!(parse_signature(&tpmt).unwrap(), QuoteSignature::RsaSsa(&raw));

        let mut sha1 = tpmt_signature(TPM_ALG_RSASSA, &raw);
        sha1[3] = 0x04;
        assert!(parse_signature(&sha1).is_err());
    }
}
