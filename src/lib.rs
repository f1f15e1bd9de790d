pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

pub use crate::config::ServerConfig;
pub use crate::error::HttpError;
pub use crate::http::{Request, Response, SuccessResponse};
pub use crate::middleware::{Chain, ErrorHandler, Handler, IntoHandlers};
pub use crate::router::{RouteMatch, Router};
pub use crate::server::{Server, ServerHandle};
