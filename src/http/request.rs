use std::collections::HashMap;
use std::net::SocketAddr;

use http::Method;
use serde_json::Value;

/// Parsed HTTP request.
///
/// Built by the acceptor from the wire, enriched with route parameters by
/// lookup and, optionally, with a decoded body by a body-decoding
/// middleware. After that pre-dispatch phase it is read-only in spirit:
/// handlers receive `&mut` access but ordinary handlers only read.
pub struct Request {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    params: HashMap<String, String>,
    raw_body: Vec<u8>,
    body: Option<Value>,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            params: HashMap::new(),
            raw_body: Vec::new(),
            body: None,
            remote_addr: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Route parameter captured by a `:name` pattern segment.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Query-string value for one key.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_map(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn set_query(&mut self, query: HashMap<String, String>) {
        self.query = query;
    }

    /// Header lookup, case-insensitive in the name. Stored names keep the
    /// spelling they arrived with.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Insert a header; a repeated name keeps the last write.
    pub fn insert_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Body bytes exactly as read from the wire.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn set_raw_body(&mut self, raw_body: Vec<u8>) {
        self.raw_body = raw_body;
    }

    /// Decoded body, present only after a body-decoding middleware ran.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn set_remote_addr(&mut self, addr: SocketAddr) {
        self.remote_addr = Some(addr);
    }
}
