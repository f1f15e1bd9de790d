//! Wire-level tests: real sockets against a started server.

#![allow(clippy::unwrap_used)]


use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use serde_json::json;
use tracing_util::TestTracing;
use trellis::middleware::{handler, Chain, JsonBody};
use trellis::{HttpError, Request, Response, Router, Server, ServerConfig, ServerHandle};

fn send_raw(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(raw.as_bytes()).unwrap();
    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);
    response
}

fn test_config() -> ServerConfig {
    ServerConfig {
        workers: 4,
        ..ServerConfig::default()
    }
}

fn start_app() -> (ServerHandle, Arc<AtomicBool>) {
    let _tracing = TestTracing::init();
    let after_ran = Arc::new(AtomicBool::new(false));
    let after_flag = Arc::clone(&after_ran);

    let mut app = Server::with_config(test_config());
    app.get(
        "/products",
        |_req: &mut Request, res: &mut Response, _next: &mut Chain| res.send("all products"),
    )
    .unwrap();
    app.get(
        "/products/:id",
        |req: &mut Request, res: &mut Response, _next: &mut Chain| {
            let id = req.param("id").unwrap_or_default().to_string();
            res.send(format!("product {id}"))
        },
    )
    .unwrap();
    app.get(
        "/search",
        |req: &mut Request, res: &mut Response, _next: &mut Chain| {
            let q = req.query("q").unwrap_or_default().to_string();
            res.send(format!("query {q}"))
        },
    )
    .unwrap();
    app.route(
        Method::GET,
        "/",
        vec![
            handler(|_req: &mut Request, res: &mut Response, _next: &mut Chain| res.send("ok")),
            handler(
                move |_req: &mut Request, res: &mut Response, _next: &mut Chain| {
                    after_flag.store(true, Ordering::SeqCst);
                    res.send("should not run")
                },
            ),
        ],
    )
    .unwrap();
    app.route(
        Method::POST,
        "/api/echo",
        (
            JsonBody,
            |req: &mut Request, res: &mut Response, _next: &mut Chain| {
                let body = req.body().cloned().unwrap_or(serde_json::Value::Null);
                res.json(&json!({ "received": body }))
            },
        ),
    )
    .unwrap();
    app.get(
        "/fail",
        |_req: &mut Request, _res: &mut Response, _next: &mut Chain| {
            Err(HttpError::response(418, "teapot"))
        },
    )
    .unwrap();

    let mut api = Router::new();
    api.get(
        "/blogs",
        |_req: &mut Request, res: &mut Response, _next: &mut Chain| res.send("blog list"),
    )
    .unwrap();
    app.mount("/v1", api).unwrap();

    let server = app.start("127.0.0.1:0").unwrap();
    server.wait_ready().unwrap();
    (server, after_ran)
}

#[test]
fn test_route_with_param_over_the_wire() {
    let (server, _) = start_app();
    let response = send_raw(server.addr(), "GET /products/123 HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.ends_with("product 123"));
    server.stop();
}

#[test]
fn test_not_found_over_the_wire() {
    let (server, _) = start_app();
    let response = send_raw(server.addr(), "GET /unknown HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(response.ends_with("Cannot GET /unknown"));
    server.stop();
}

#[test]
fn test_method_not_allowed_over_the_wire() {
    let (server, _) = start_app();
    let response = send_raw(server.addr(), "POST /products HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(response.ends_with("Cannot POST /products"));
    server.stop();
}

#[test]
fn test_short_circuit_skips_later_handlers() {
    let (server, after_ran) = start_app();
    let response = send_raw(server.addr(), "GET / HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("ok"));
    assert!(!after_ran.load(Ordering::SeqCst));
    server.stop();
}

#[test]
fn test_mounted_route_over_the_wire() {
    let (server, _) = start_app();
    let response = send_raw(server.addr(), "GET /v1/blogs HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("blog list"));
    server.stop();
}

#[test]
fn test_query_string_over_the_wire() {
    let (server, _) = start_app();
    let response = send_raw(server.addr(), "GET /search?q=rust&x=1 HTTP/1.1\r\n\r\n");
    assert!(response.ends_with("query rust"));
    server.stop();
}

#[test]
fn test_json_echo_over_the_wire() {
    let (server, _) = start_app();
    let body = r#"{"name":"widget"}"#;
    let raw = format!(
        "POST /api/echo HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = send_raw(server.addr(), &raw);
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: application/json\r\n"));
    assert!(response.contains(r#""received":{"name":"widget"}"#));
    server.stop();
}

#[test]
fn test_unhandled_error_writes_status_and_message() {
    let (server, _) = start_app();
    let response = send_raw(server.addr(), "GET /fail HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 418 Unknown\r\n"));
    assert!(response.ends_with("teapot"));
    server.stop();
}

#[test]
fn test_malformed_request_line_is_bad_request() {
    let (server, _) = start_app();
    let response = send_raw(server.addr(), "GET\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(response.ends_with("400 Bad Request"));
    server.stop();
}

#[test]
fn test_pool_survives_sequential_requests() {
    let (server, _) = start_app();
    for i in 0..5 {
        let response = send_raw(server.addr(), &format!("GET /products/{i} HTTP/1.1\r\n\r\n"));
        assert!(response.ends_with(&format!("product {i}")), "request {i}");
    }
    assert!(server.pool_metrics().dispatched() >= 5);
    server.stop();
}

#[test]
fn test_error_handler_formats_chain_errors() {
    let _tracing = TestTracing::init();
    let mut app = Server::with_config(test_config());
    app.get(
        "/boom",
        |_req: &mut Request, _res: &mut Response, _next: &mut Chain| {
            Err(HttpError::response(500, "boom"))
        },
    )
    .unwrap();
    app.error_handler(|err: HttpError, _req: &mut Request, res: &mut Response| {
        res.status(err.status())
            .json(&json!({"status": err.status(), "message": err.message()}))
    });

    let server = app.start("127.0.0.1:0").unwrap();
    server.wait_ready().unwrap();

    let response = send_raw(server.addr(), "GET /boom HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(response.contains(r#""message":"boom""#));
    // Lookup failures keep bypassing the error handler.
    let response = send_raw(server.addr(), "GET /nope HTTP/1.1\r\n\r\n");
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.ends_with("Cannot GET /nope"));
    server.stop();
}
