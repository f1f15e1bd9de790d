//! Tests for the middleware chain engine: ordering, cooperative `next`,
//! and the single-shot error-handler contract.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::capture;
use http::Method;
use trellis::middleware::{handler, Chain, Handler};
use trellis::{HttpError, Request, Response};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn tag(label: &'static str, log: &Log) -> impl Handler {
    let log = Arc::clone(log);
    move |req: &mut Request, res: &mut Response, next: &mut Chain| {
        log.lock().unwrap().push(label);
        next.next(req, res)
    }
}

fn request() -> Request {
    Request::new(Method::GET, "/")
}

#[test]
fn test_handlers_run_in_list_order() {
    let log: Log = Log::default();
    let mut chain = Chain::new(
        vec![
            handler(tag("a", &log)),
            handler(tag("b", &log)),
            handler(tag("c", &log)),
        ],
        None,
    );
    let (mut res, _buf) = capture();
    chain.next(&mut request(), &mut res).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(chain.remaining(), 0);
}

#[test]
fn test_terminal_write_without_next_stops_the_chain() {
    let log: Log = Log::default();
    let after = tag("after", &log);
    let mut chain = Chain::new(
        vec![
            handler(|_req: &mut Request, res: &mut Response, _next: &mut Chain| res.send("ok")),
            handler(after),
        ],
        None,
    );
    let (mut res, buf) = capture();
    chain.next(&mut request(), &mut res).unwrap();

    assert!(res.finished());
    assert_eq!(res.status_code(), 200);
    assert!(buf.contents().ends_with("ok"));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_onion_model_resumes_after_next() {
    let log: Log = Log::default();
    let outer_log = Arc::clone(&log);
    let outer = move |req: &mut Request, res: &mut Response, next: &mut Chain| {
        outer_log.lock().unwrap().push("outer-pre");
        next.next(req, res)?;
        outer_log.lock().unwrap().push("outer-post");
        Ok(())
    };
    let mut chain = Chain::new(vec![handler(outer), handler(tag("inner", &log))], None);
    let (mut res, _buf) = capture();
    chain.next(&mut request(), &mut res).unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["outer-pre", "inner", "outer-post"]
    );
}

#[test]
fn test_error_reaches_error_handler_as_json() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = Arc::clone(&calls);
    let error_handler = move |err: HttpError, _req: &mut Request, res: &mut Response| {
        handler_calls.fetch_add(1, Ordering::SeqCst);
        res.status(err.status()).json(&serde_json::json!({
            "status": err.status(),
            "message": err.message(),
        }))
    };

    let mut chain = Chain::new(
        vec![handler(
            |_req: &mut Request, _res: &mut Response, _next: &mut Chain| {
                Err(HttpError::response(500, "boom"))
            },
        )],
        Some(Arc::new(error_handler)),
    );
    let (mut res, buf) = capture();
    chain.next(&mut request(), &mut res).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let out = buf.contents();
    assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(out.contains("\"message\":\"boom\""));
}

#[test]
fn test_error_without_handler_propagates() {
    let mut chain = Chain::new(
        vec![handler(
            |_req: &mut Request, _res: &mut Response, _next: &mut Chain| {
                Err(HttpError::bad_request("nope"))
            },
        )],
        None,
    );
    let (mut res, _buf) = capture();
    let err = chain.next(&mut request(), &mut res).unwrap_err();
    assert_eq!(err, HttpError::bad_request("nope"));
    assert!(!res.finished());
}

#[test]
fn test_error_handler_runs_at_most_once_per_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = Arc::clone(&calls);
    let error_handler = move |_err: HttpError, _req: &mut Request, _res: &mut Response| {
        handler_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    // The outer handler fails after the inner one already failed and was
    // handled; the second error must propagate instead of re-entering the
    // error handler.
    let outer = |req: &mut Request, res: &mut Response, next: &mut Chain| {
        next.next(req, res)?;
        Err(HttpError::response(500, "outer"))
    };
    let inner = |_req: &mut Request, _res: &mut Response, _next: &mut Chain| {
        Err(HttpError::response(500, "inner"))
    };

    let mut chain = Chain::new(
        vec![handler(outer), handler(inner)],
        Some(Arc::new(error_handler)),
    );
    let (mut res, _buf) = capture();
    let err = chain.next(&mut request(), &mut res).unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err, HttpError::response(500, "outer"));
}

#[test]
fn test_error_inside_error_handler_propagates() {
    let error_handler = |_err: HttpError, _req: &mut Request, _res: &mut Response| {
        Err(HttpError::internal("error handler exploded"))
    };
    let mut chain = Chain::new(
        vec![handler(
            |_req: &mut Request, _res: &mut Response, _next: &mut Chain| {
                Err(HttpError::response(409, "taken"))
            },
        )],
        Some(Arc::new(error_handler)),
    );
    let (mut res, _buf) = capture();
    let err = chain.next(&mut request(), &mut res).unwrap_err();
    assert_eq!(err, HttpError::internal("error handler exploded"));
}

#[test]
fn test_empty_chain_is_a_quiet_noop() {
    let mut chain = Chain::new(Vec::new(), None);
    let (mut res, buf) = capture();
    chain.next(&mut request(), &mut res).unwrap();
    assert!(!res.finished());
    assert!(buf.contents().is_empty());
}
