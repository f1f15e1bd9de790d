//! # Router Module
//!
//! Path routing for trellis. Routes live in a tree keyed by path segments:
//! literal segments match exactly, `:name` segments match any single
//! segment and capture it as a parameter, and each endpoint node carries an
//! ordered handler chain per HTTP method.
//!
//! ## Matching rules
//!
//! - A literal child always beats the parameter child at the same depth.
//! - A node has at most one parameter child; registering a second one under
//!   a different name is a [`RouteError`].
//! - An unmatched path is `not-found`; a matched endpoint without the
//!   requested method is `method-not-allowed`.
//!
//! ## Composition
//!
//! Global middlewares registered with [`Router::middleware`] /
//! [`Router::middleware_at`] are prepended, at registration time, to the
//! chains of routes registered afterwards. Sub-routers attach beneath a
//! prefix via [`Router::mount`], which also rebases the sub-router's global
//! middlewares under that prefix.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut router = Router::new();
//! router.get("/products/:id", |req: &mut Request, res: &mut Response, _next: &mut Chain| {
//!     let id = req.param("id").unwrap_or_default();
//!     res.send(id)
//! })?;
//!
//! let found = router.search(&Method::GET, "/products/123")?;
//! assert_eq!(found.param("id"), Some("123"));
//! ```

mod core;
mod path;
mod tree;

pub use core::{RouteError, RouteMatch, Router};
