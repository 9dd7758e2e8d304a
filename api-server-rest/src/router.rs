// Copyright (c) 2025 The Attestation Verifier Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use anyhow::Result;
use async_trait::async_trait;
use hyper::{header, Body, Request, Response, StatusCode};
use log::debug;
use std::collections::HashMap;
use std::net::SocketAddr;

#[async_trait]
pub trait ApiHandler: Send + Sync {
    /// Handle a request whose path starts with the root this handler was
    /// registered under. `url_path` is the remainder after that root.
    async fn handle_request(
        &self,
        remote_addr: SocketAddr,
        url_path: &str,
        req: Request<Body>,
    ) -> Result<Response<Body>>;

    fn json_response(&self, body: Vec<u8>) -> Result<Response<Body>> {
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))?)
    }

    fn bad_request(&self, reason: &'static str) -> Result<Response<Body>> {
        status_response(StatusCode::BAD_REQUEST, reason)
    }

    fn not_allowed(&self) -> Result<Response<Body>> {
        status_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    fn not_found(&self) -> Result<Response<Body>> {
        status_response(StatusCode::NOT_FOUND, "Not found")
    }

    fn internal_error(&self, reason: String) -> Result<Response<Body>> {
        status_response(StatusCode::INTERNAL_SERVER_ERROR, reason)
    }
}

fn status_response(status: StatusCode, body: impl Into<Body>) -> Result<Response<Body>> {
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(body.into())?)
}

/// Dispatches requests by the first path segment. Immutable once built, so a
/// single instance is shared by all connections without locking.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Box<dyn ApiHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_route(&mut self, root: &str, handler: Box<dyn ApiHandler>) {
        self.routes.insert(root.to_string(), handler);
    }

    pub async fn route(
        &self,
        remote_addr: SocketAddr,
        req: Request<Body>,
    ) -> Result<Response<Body>> {
        let path = req.uri().path().to_string();
        debug!("{} {} from {}", req.method(), path, remote_addr);

        // Authority-form (`CONNECT host:port`) and asterisk-form targets have
        // no leading '/' and match no route.
        let Some(rest) = path.strip_prefix('/') else {
            return status_response(StatusCode::NOT_FOUND, "Not found");
        };
        let split = rest.find('/').map_or(path.len(), |i| i + 1);
        let (root, url_path) = path.split_at(split);

        match self.routes.get(root) {
            Some(handler) => handler.handle_request(remote_addr, url_path, req).await,
            None => status_response(StatusCode::NOT_FOUND, "Not found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ApiHandler for Echo {
        async fn handle_request(
            &self,
            _remote_addr: SocketAddr,
            url_path: &str,
            _req: Request<Body>,
        ) -> Result<Response<Body>> {
            Ok(Response::new(Body::from(url_path.to_string())))
        }
    }

    async fn route(router: &Router, uri: &str) -> (StatusCode, String) {
        route_with(router, hyper::Method::GET, uri).await
    }

    async fn route_with(router: &Router, method: hyper::Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = router
            .route("127.0.0.1:40000".parse().unwrap(), req)
            .await
            .unwrap();
        let status = res.status();
        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_route() {
        let mut router = Router::new();
        router.register_route("/verify", Box::new(Echo));

        assert_eq!(route(&router, "/verify").await, (StatusCode::OK, "".into()));
        assert_eq!(
            route(&router, "/verify/sub?x=1").await,
            (StatusCode::OK, "/sub".into())
        );
        assert_eq!(route(&router, "/verifyx").await.0, StatusCode::NOT_FOUND);
        assert_eq!(route(&router, "/").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_route_without_leading_slash() {
        let mut router = Router::new();
        router.register_route("/verify", Box::new(Echo));

        let (status, _) = route_with(&router, hyper::Method::CONNECT, "example.com:443").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = route_with(&router, hyper::Method::OPTIONS, "*").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
