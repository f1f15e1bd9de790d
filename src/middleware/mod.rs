//! # Middleware Module
//!
//! The middleware engine and the bundled middleware.
//!
//! A request is processed by a [`Chain`]: the ordered handler list composed
//! for its route, plus an optional error handler. Each [`Handler`] is
//! invoked with the request, the response and the chain itself; it either
//! finishes the response or calls [`Chain::next`] to hand control onward.
//! Errors returned by handlers are caught by the chain and dispatched to
//! the [`ErrorHandler`] exactly once.
//!
//! Bundled middleware:
//!
//! - [`JsonBody`] - decodes `application/json` bodies into the request's
//!   body slot
//! - [`Urlencoded`] - decodes form-encoded bodies
//! - [`Cors`] - origin allow list and preflight handling
//! - [`AccessLog`] - one structured `tracing` event per finished response

mod chain;
mod core;
mod cors;
mod json;
mod logger;
mod urlencoded;

pub use chain::Chain;
pub use core::{
    handler, ArcErrorHandler, ArcHandler, ErrorHandler, Handler, HandlerTuple, HandlerVec,
    IntoHandlers, SingleHandler,
};
pub use cors::{Cors, CorsConfigError};
pub use json::JsonBody;
pub use logger::AccessLog;
pub use urlencoded::Urlencoded;
