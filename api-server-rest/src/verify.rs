// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use crate::router::ApiHandler;
use anyhow::{Context, Result};
use async_trait::async_trait;
use hyper::{body, Body, Method, Request, Response};
use log::{info, warn};
use std::net::SocketAddr;
use verifier::{AttestationRequest, Verifier, VerifyResponse};

/// ROOT path for the verification API
pub const VERIFY_ROOT: &str = "/verify";

pub struct VerifyHandler {
    verifier: Verifier,
}

#[async_trait]
impl ApiHandler for VerifyHandler {
    async fn handle_request(
        &self,
        remote_addr: SocketAddr,
        url_path: &str,
        req: Request<Body>,
    ) -> Result<Response<Body>> {
        if !matches!(url_path, "" | "/") {
            return self.not_found();
        }

        if req.method() != Method::POST {
            return self.not_allowed();
        }

        let body_bytes = match body::to_bytes(req.into_body()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read request body from {remote_addr}: {e}");
                return self.bad_request("Invalid request");
            }
        };
        let request: AttestationRequest = match serde_json::from_slice(&body_bytes) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid verification request from {remote_addr}: {e}");
                return self.bad_request("Invalid request");
            }
        };

        info!("Verification request from {remote_addr}");
        let response = self.verify(&request).await;
        let body = serde_json::to_vec(&response).context("serialize verification response")?;
        self.json_response(body)
    }
}

impl VerifyHandler {
    pub fn new(verifier: Verifier) -> Self {
        Self { verifier }
    }

    pub async fn verify(&self, request: &AttestationRequest) -> VerifyResponse {
        self.verifier.verify(request).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use std::sync::Arc;
    use verifier::{
        Artifact, Baseline, OracleOutcome, QuoteOracle, SessionConfig, StagedArtifacts, Status,
    };

    struct MessageOracle;

    #[async_trait]
    impl QuoteOracle for MessageOracle {
        async fn check(&self, artifacts: &StagedArtifacts) -> Result<OracleOutcome> {
            match artifacts.read(Artifact::Message).await?.as_slice() {
                b"good-quote" => Ok(OracleOutcome::valid("")),
                _ => Ok(OracleOutcome::invalid("signature mismatch")),
            }
        }
    }

    fn handler(scratch_dir: &std::path::Path) -> VerifyHandler {
        let baseline = Baseline::from_file("tests/pcr_values.json").unwrap();
        let config = SessionConfig {
            scratch_dir: scratch_dir.to_path_buf(),
            ..Default::default()
        };
        VerifyHandler::new(Verifier::new(
            Arc::new(baseline),
            Arc::new(MessageOracle),
            config,
        ))
    }

    async fn post(handler: &VerifyHandler, body: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(Method::POST)
            .uri(VERIFY_ROOT)
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = handler
            .handle_request("127.0.0.1:40000".parse().unwrap(), "", req)
            .await
            .unwrap();
        let status = res.status();
        let body = body::to_bytes(res.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn request_json(message: &str, pcr_values: &str) -> String {
        serde_json::json!({
            "message": message,
            "signature": "sig",
            "nonce": "nonce",
            "pubkey": "key",
            "pcr_values": pcr_values,
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_verify_endpoint() {
        let scratch = tempfile::tempdir().unwrap();
        let handler = handler(scratch.path());

        let (status, body) = post(&handler, &request_json("good-quote", "0 ab12\n1 cd34")).await;
        assert_eq!(status, StatusCode::OK);
        let response: VerifyResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.message, "registers match baseline");

        let (status, body) = post(&handler, &request_json("good-quote", "0 ab12\n1 ffff")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"status":"FAIL","message":"register 1 mismatch: expected cd34, got ffff"}"#
        );

        let (status, body) = post(&handler, &request_json("forged", "0 ab12\n1 cd34")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"FAIL","message":"signature mismatch"}"#);
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let scratch = tempfile::tempdir().unwrap();
        let handler = handler(scratch.path());

        let (status, body) = post(&handler, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid request");

        let (status, _) = post(&handler, r#"{"message":"good-quote"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let scratch = tempfile::tempdir().unwrap();
        let handler = handler(scratch.path());

        let req = Request::builder()
            .method(Method::GET)
            .uri(VERIFY_ROOT)
            .body(Body::empty())
            .unwrap();
        let res = handler
            .handle_request("127.0.0.1:40000".parse().unwrap(), "", req)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
