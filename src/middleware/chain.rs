use tracing::debug;

use crate::error::HttpError;
use crate::http::{Request, Response};

use super::core::{ArcErrorHandler, ArcHandler};

/// Execution engine for one request's handler chain.
///
/// Handlers run in list order; each receives the chain itself as its `next`
/// continuation, so calling [`Chain::next`] from inside a handler runs the
/// remainder of the chain and returns when it is done (the onion model,
/// fully synchronous). An error returned by any handler is dispatched to
/// the error handler at most once per request; a later error, or an error
/// raised by the error handler itself, propagates to the caller.
///
/// The chain never writes to the response on its own. Running off the end
/// with no terminal write leaves the response untouched.
pub struct Chain {
    handlers: Vec<ArcHandler>,
    index: usize,
    error_handler: Option<ArcErrorHandler>,
    errored: bool,
}

impl Chain {
    pub fn new(handlers: Vec<ArcHandler>, error_handler: Option<ArcErrorHandler>) -> Self {
        Self {
            handlers,
            index: 0,
            error_handler,
            errored: false,
        }
    }

    /// Run the next handler, if any.
    ///
    /// A handler that neither writes nor calls `next` simply ends the
    /// chain's progress; the acceptor decides what an unwritten response
    /// means.
    pub fn next(&mut self, req: &mut Request, res: &mut Response) -> Result<(), HttpError> {
        if let Some(current) = self.handlers.get(self.index).cloned() {
            self.index += 1;
            if let Err(err) = current.handle(req, res, self) {
                return self.fail(err, req, res);
            }
        }
        Ok(())
    }

    /// Dispatch an error to the chain's error handler.
    ///
    /// Without an error handler, or once it has already run for this
    /// request, the error is returned to the caller instead.
    pub fn fail(
        &mut self,
        err: HttpError,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<(), HttpError> {
        if self.errored {
            debug!(status = err.status(), "error handler already ran, propagating");
            return Err(err);
        }
        self.errored = true;
        match self.error_handler.clone() {
            Some(error_handler) => error_handler.handle(err, req, res),
            None => Err(err),
        }
    }

    /// Handlers not yet started.
    pub fn remaining(&self) -> usize {
        self.handlers.len().saturating_sub(self.index)
    }
}
