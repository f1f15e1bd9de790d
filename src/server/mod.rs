//! # Server Module
//!
//! The connection acceptor on top of the `may` coroutine runtime.
//!
//! One accept-loop coroutine hands each connection to a bounded pool of
//! worker coroutines created once at start. A worker runs the whole
//! pipeline synchronously: parse the request head and body, resolve the
//! route, drive the middleware chain, and close the connection through the
//! response's terminal write or a fallback write.
//!
//! ```text
//! accept loop -> worker pool -> parse -> Router::search -> Chain -> Response
//! ```
//!
//! Routing tables freeze when the server starts; [`Server::start`] consumes
//! the server, so there is no registration concurrent with serving.

mod conn;
mod core;
mod pool;

pub use core::{Server, ServerHandle};
pub use pool::PoolMetrics;
