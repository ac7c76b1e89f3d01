//! End-to-end tests over a real `may_minihttp` server
//!
//! # Test Fixtures
//!
//! - `TestServer`: registers the sample resources, binds an ephemeral port and
//!   stops the server on drop
//!
//! Requests are raw HTTP/1.1 written to a `TcpStream`.

use restdispatch::dispatcher::Dispatcher;
use restdispatch::registry::ResourceRegistry;
use restdispatch::server::{AppService, HttpServer, ServerHandle};
use serde_json::json;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

mod common;
use common::http::{parse_response, send_request, RawResponse};
use common::resources::{Account, Boom, Profile};
use common::test_server::setup_may_runtime;

/// Test fixture with automatic teardown using RAII
struct TestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
    profile: Arc<Profile>,
}

impl TestServer {
    fn new() -> Self {
        setup_may_runtime();

        let profile = Arc::new(Profile::default());
        let registry = Arc::new(ResourceRegistry::new());
        registry.register(profile.clone()).unwrap();
        registry.register(Arc::new(Boom)).unwrap();
        registry.register(Arc::new(Account)).unwrap();
        let service = AppService::new(Arc::new(Dispatcher::new(registry)));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let handle = HttpServer(service).start(addr).unwrap();
        handle.wait_ready().unwrap();

        Self {
            handle: Some(handle),
            addr,
            profile,
        }
    }

    fn request(&self, raw: &str) -> RawResponse {
        parse_response(&send_request(&self.addr, raw))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn test_get_registered_resource() {
    let server = TestServer::new();
    let resp = server.request("GET /user/profile/?id=42 HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    assert_eq!(resp.json(), json!({ "id": "42" }));
    assert_eq!(server.profile.calls(), vec!["prepare", "GET"]);
}

#[test]
fn test_path_without_trailing_slash() {
    let server = TestServer::new();
    let resp = server.request("GET /user/profile HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(resp.status, 200);
}

#[test]
fn test_unknown_resource_is_404_envelope() {
    let server = TestServer::new();
    let resp = server.request("GET /user/unknown/ HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.json()["errCode"], "resource:not_found");
    assert_eq!(resp.json()["errMsg"], "无效的endpoint");
}

#[test]
fn test_patch_is_405_plain_text() {
    let server = TestServer::new();
    let resp = server.request("PATCH /user/profile/ HTTP/1.1\r\nHost: x\r\nContent-Length: 0\r\n\r\n");
    assert_eq!(resp.status, 405);
    assert_eq!(resp.body, "Method Not Allowed");
    assert_eq!(resp.header("x-content-type-options"), Some("nosniff"));
    assert!(server.profile.calls().is_empty());
}

#[test]
fn test_post_form_body() {
    let server = TestServer::new();
    let body = "name=Grace";
    let raw = format!(
        "POST /user/profile/ HTTP/1.1\r\nHost: x\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let resp = server.request(&raw);
    assert_eq!(resp.status, 201);
    assert_eq!(resp.json(), json!({ "created": "Grace" }));
}

#[test]
fn test_panicking_resource_is_500() {
    let server = TestServer::new();
    let resp = server.request("GET /ops/boom/ HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(resp.status, 500);
    assert_eq!(resp.json()["errCode"], "rest:internal_error");

    let resp = server.request("GET /user/profile/ HTTP/1.1\r\nHost: x\r\n\r\n");
    assert_eq!(resp.status, 200);
}

#[test]
fn test_computed_header_reaches_the_wire() {
    let server = TestServer::new();
    for id in ["7", "8", "7"] {
        let raw = format!("POST /user/account/?id={id} HTTP/1.1\r\nHost: x\r\nContent-Length: 0\r\n\r\n");
        let resp = server.request(&raw);
        assert_eq!(resp.status, 201);
        assert_eq!(resp.header("location"), Some(format!("/user/{id}/").as_str()));
        assert_eq!(resp.header("cache-control"), Some("no-store"));
    }
}
