//! Per-connection request handling.
//!
//! One connection carries exactly one request: parse the head, resolve the
//! route, drive the chain, and let the response's terminal write (or a
//! fallback write here) close the socket. Every exit path either finishes
//! the response or drops the connection, so sockets are released exactly
//! once.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read};

use http::Method;
use may::net::TcpStream;
use tracing::{debug, warn};

use crate::http::{Request, Response};
use crate::middleware::Chain;

use super::core::ServerShared;

pub(crate) fn handle_connection(stream: TcpStream, shared: &ServerShared) {
    if let Err(err) = stream.set_read_timeout(Some(shared.config.read_timeout)) {
        warn!(error = %err, "failed to set read timeout");
    }
    let peer = stream.peer_addr().ok();

    let mut reader = BufReader::new(stream);
    let parsed = read_request(&mut reader);
    let mut res = Response::new(Box::new(reader.into_inner()));

    match parsed {
        // Empty request line: close without a response.
        Ok(None) => {}
        Err(err) => {
            debug!(error = %err, "failed to read request");
            let _ = res.status(400).send("400 Bad Request");
        }
        Ok(Some(mut req)) => {
            if let Some(addr) = peer {
                req.set_remote_addr(addr);
            }
            respond(&mut req, &mut res, shared);
        }
    }
}

/// Route the request and drive its chain.
///
/// Lookup failures (404/405) are written here and never reach the user
/// error handler; an error escaping the chain is written as a plain status
/// and message unless a terminal write already happened.
fn respond(req: &mut Request, res: &mut Response, shared: &ServerShared) {
    let found = match shared.router.search(req.method(), req.path()) {
        Ok(found) => found,
        Err(err) => {
            let _ = res.status(err.status()).send(err.message());
            return;
        }
    };

    req.set_params(found.params);
    let mut chain = Chain::new(found.handlers, shared.error_handler.clone());
    if let Err(err) = chain.next(req, res) {
        if res.finished() {
            debug!(
                status = err.status(),
                "error raised after the response was sent"
            );
        } else {
            let _ = res.status(err.status()).send(err.message());
        }
    }
}

/// Read one request head plus body from the connection.
///
/// Returns `Ok(None)` for an empty request line. The body honors
/// `Content-Length` when present; without it only the bytes that arrived
/// buffered with the head are drained.
pub(crate) fn read_request<S: Read>(reader: &mut BufReader<S>) -> io::Result<Option<Request>> {
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let request_line = request_line.trim_end();
    if request_line.is_empty() {
        return Ok(None);
    }

    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => (method, target),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "malformed request line",
            ))
        }
    };
    let method: Method = method
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "unrecognized method"))?;

    let (path, query) = match target.split_once('?') {
        Some((path, query_string)) => (path, parse_query(query_string)),
        None => (target, HashMap::new()),
    };

    let mut req = Request::new(method, path);
    req.set_query(query);

    loop {
        let mut header_line = String::new();
        if reader.read_line(&mut header_line)? == 0 {
            break;
        }
        let header_line = header_line.trim_end();
        if header_line.is_empty() {
            break;
        }
        if let Some((name, value)) = header_line.split_once(':') {
            req.insert_header(name.trim(), value.trim());
        }
    }

    let body = read_body(reader, &req)?;
    req.set_raw_body(body);
    Ok(Some(req))
}

/// Query pairs split on `&` and `=`; a pair without exactly one `=` is
/// dropped. Values stay as they arrived, undecoded.
fn parse_query(query_string: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for pair in query_string.split('&') {
        let mut pieces = pair.split('=');
        if let (Some(key), Some(value), None) = (pieces.next(), pieces.next(), pieces.next()) {
            query.insert(key.to_string(), value.to_string());
        }
    }
    query
}

fn read_body<S: Read>(reader: &mut BufReader<S>, req: &Request) -> io::Result<Vec<u8>> {
    if let Some(length) = req
        .header("content-length")
        .and_then(|value| value.parse::<usize>().ok())
    {
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;
        return Ok(body);
    }

    // No declared length: take what is already buffered without blocking.
    let buffered = reader.buffer().to_vec();
    reader.consume(buffered.len());
    Ok(buffered)
}
