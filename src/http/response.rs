use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;
use tracing::warn;

use super::status::reason_phrase;
use crate::error::HttpError;

type FinishHook = Box<dyn FnOnce(&Response) + Send>;

/// Single-use HTTP response over a connection.
///
/// Status and headers accumulate until a terminal write ([`Response::send`]
/// or [`Response::json`]) serializes the status line, headers,
/// `Content-Length` and body, flushes, runs the finish hook and closes the
/// connection by dropping the writer. After that the response is finished:
/// further terminal calls log a diagnostic and return without writing.
pub struct Response {
    writer: Option<Box<dyn Write + Send>>,
    status: u16,
    headers: HashMap<String, String>,
    body_length: usize,
    finished: bool,
    on_finish: Option<FinishHook>,
}

impl Response {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Some(writer),
            status: 200,
            headers: HashMap::new(),
            body_length: 0,
            finished: false,
            on_finish: None,
        }
    }

    /// Response that discards its output. Useful when driving a chain
    /// without a connection.
    pub fn sink() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Set the status code for the eventual terminal write.
    pub fn status(&mut self, status: u16) -> &mut Self {
        if self.finished {
            warn!(status, "status change after the response was sent, ignoring");
            return self;
        }
        self.status = status;
        self
    }

    /// Set a header emitted verbatim after the defaults.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        if self.finished {
            warn!("header change after the response was sent, ignoring");
            return self;
        }
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Register a callback to run once, right after the terminal write.
    pub fn on_finish(&mut self, hook: impl FnOnce(&Response) + Send + 'static) {
        self.on_finish = Some(Box::new(hook));
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Byte length of the body written by the terminal write; 0 before.
    pub fn body_length(&self) -> usize {
        self.body_length
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Terminal write of a plain-text body.
    pub fn send(&mut self, body: impl AsRef<str>) -> Result<(), HttpError> {
        self.write_terminal(body.as_ref().as_bytes(), "text/plain")
    }

    /// Terminal write of a JSON body.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), HttpError> {
        let payload = serde_json::to_vec(value)
            .map_err(|err| HttpError::internal(format!("JSON serialization failed: {err}")))?;
        self.write_terminal(&payload, "application/json")
    }

    fn write_terminal(&mut self, payload: &[u8], content_type: &str) -> Result<(), HttpError> {
        if self.finished {
            warn!(status = self.status, "response already sent, write ignored");
            return Ok(());
        }
        let mut writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                warn!("response writer already consumed, write ignored");
                return Ok(());
            }
        };

        let mut head = String::with_capacity(128);
        head.push_str("HTTP/1.1 ");
        head.push_str(&self.status.to_string());
        head.push(' ');
        head.push_str(reason_phrase(self.status));
        head.push_str("\r\n");
        head.push_str("Content-Type: ");
        head.push_str(content_type);
        head.push_str("\r\n");
        head.push_str("Content-Length: ");
        head.push_str(&payload.len().to_string());
        head.push_str("\r\n");
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        writer.write_all(head.as_bytes())?;
        writer.write_all(payload)?;
        writer.flush()?;

        self.finished = true;
        self.body_length = payload.len();
        if let Some(hook) = self.on_finish.take() {
            hook(self);
        }
        // The writer drops here, closing the connection.
        Ok(())
    }
}
