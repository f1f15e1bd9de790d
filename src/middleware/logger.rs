use std::time::Instant;

use tracing::info;

use crate::error::HttpError;
use crate::http::{Request, Response};

use super::chain::Chain;
use super::core::Handler;

/// Access-log middleware.
///
/// Hooks the response's finish callback at request start and emits one
/// structured event per completed response, carrying method, path, status,
/// body length and latency. Responses that never finish (a handler that
/// neither writes nor fails) log nothing.
pub struct AccessLog;

impl Handler for AccessLog {
    fn handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        next: &mut Chain,
    ) -> Result<(), HttpError> {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();
        let remote = req.remote_addr();
        res.on_finish(move |res: &Response| {
            info!(
                method = %method,
                path = %path,
                status = res.status_code(),
                length = res.body_length(),
                latency_ms = start.elapsed().as_millis() as u64,
                remote = ?remote,
                "request completed"
            );
        });
        next.next(req, res)
    }
}
