use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use http::Method;
use tracing::{debug, warn};

use super::path;
use super::tree::{ParamChild, ParamSlots, RouteNode};
use crate::error::HttpError;
use crate::middleware::{ArcHandler, IntoHandlers};

/// Result of resolving `(method, path)` against a router.
///
/// Carries the effective handler chain (globals composed at registration
/// time followed by the route's own handlers) and the parameter values
/// extracted from the request path.
#[derive(Clone)]
pub struct RouteMatch {
    /// Ordered handler chain for this `(route, method)`.
    pub handlers: Vec<ArcHandler>,
    /// Path parameters, e.g. `:id` against `/users/7` gives `id -> "7"`.
    pub params: HashMap<String, String>,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("handlers", &format_args!("[{} handler(s)]", self.handlers.len()))
            .field("params", &self.params)
            .finish()
    }
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Rejected route registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A node already has a parameter child under a different name.
    ParamConflict {
        path: String,
        existing: String,
        offered: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::ParamConflict {
                path,
                existing,
                offered,
            } => write!(
                f,
                "cannot register '{path}': parameter ':{offered}' collides with \
                 existing parameter ':{existing}' at the same depth"
            ),
        }
    }
}

impl std::error::Error for RouteError {}

/// Segment-tree router with per-method handler chains.
///
/// Routes are registered against patterns whose `:name` segments match any
/// single path segment. A literal child always wins over the parameter
/// child at the same depth. Global middlewares registered through
/// [`Router::middleware`] and [`Router::middleware_at`] are composed into
/// the chains of routes registered afterwards; they are never applied
/// retroactively, so registration order is the single source of truth for
/// chain order.
///
/// Registration is a configuration-phase API (`&mut self`); lookup through
/// [`Router::search`] is read-only and safe to share once the server is
/// running.
pub struct Router {
    root: RouteNode,
    /// Global middlewares as ordered `(prefix, handlers)` entries. An
    /// ordered list rather than a map so composition order is deterministic.
    globals: Vec<(String, Vec<ArcHandler>)>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            root: RouteNode::new(),
            globals: Vec::new(),
        }
    }

    /// Register handlers for `GET path`.
    pub fn get<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.route(Method::GET, pattern, handlers)
    }

    /// Register handlers for `POST path`.
    pub fn post<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.route(Method::POST, pattern, handlers)
    }

    /// Register handlers for `PUT path`.
    pub fn put<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.route(Method::PUT, pattern, handlers)
    }

    /// Register handlers for `PATCH path`.
    pub fn patch<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.route(Method::PATCH, pattern, handlers)
    }

    /// Register handlers for `DELETE path`.
    pub fn delete<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.route(Method::DELETE, pattern, handlers)
    }

    /// Register handlers for an arbitrary method.
    ///
    /// Accepts a single handler, a tuple of handlers, or a
    /// `Vec<ArcHandler>`. The stored chain is the matching global
    /// middlewares followed by the given handlers in order. Re-registering
    /// the same `(method, pattern)` is a no-op; the first registration
    /// wins.
    pub fn route<M>(
        &mut self,
        method: Method,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.add_route(method, pattern, handlers.into_handlers())
    }

    fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handlers: Vec<ArcHandler>,
    ) -> Result<(), RouteError> {
        let segments = path::split(pattern);
        let mut slots = ParamSlots::new();
        let mut created = false;

        let mut current = &mut self.root;
        if segments.is_empty() {
            // The root itself never becomes an endpoint; `/` routes live on
            // a synthetic "/" child so the tree shape stays uniform.
            current = match current.children.entry("/".to_string()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    created = true;
                    entry.insert(RouteNode::new())
                }
            };
        } else {
            for (index, segment) in segments.iter().enumerate() {
                if let Some(name) = path::param_name(segment) {
                    slots.push((index, name.into()));
                    if let Some(existing) = &current.param_child {
                        if existing.name.as_ref() != name {
                            return Err(RouteError::ParamConflict {
                                path: pattern.to_string(),
                                existing: existing.name.to_string(),
                                offered: name.to_string(),
                            });
                        }
                    } else {
                        created = true;
                    }
                    let child = current
                        .param_child
                        .get_or_insert_with(|| Box::new(ParamChild::new(name)));
                    current = &mut child.node;
                } else {
                    current = match current.children.entry((*segment).to_string()) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => {
                            created = true;
                            entry.insert(RouteNode::new())
                        }
                    };
                }
            }
        }

        if !created && current.supports(&method) {
            debug!(method = %method, pattern, "route already registered, keeping first");
            return Ok(());
        }

        let mut chain: Vec<ArcHandler> = Vec::new();
        for (prefix, middlewares) in &self.globals {
            if prefix == "/" || pattern.starts_with(prefix.as_str()) {
                chain.extend(middlewares.iter().cloned());
            }
        }
        chain.extend(handlers);

        current.methods.insert(method.clone(), chain);
        current.param_slots.insert(method, slots);
        current.endpoint = true;
        Ok(())
    }

    /// Register global middleware for every subsequently registered route.
    ///
    /// Equivalent to [`Router::middleware_at`] with prefix `/`.
    pub fn middleware<M>(&mut self, handlers: impl IntoHandlers<M>) {
        self.middleware_at("/", handlers);
    }

    /// Register global middleware for routes registered afterwards whose
    /// pattern starts with `prefix`. Repeated calls for one prefix append.
    pub fn middleware_at<M>(&mut self, prefix: &str, handlers: impl IntoHandlers<M>) {
        let prefix = if prefix.is_empty() { "/" } else { prefix };
        let mut handlers = handlers.into_handlers();
        match self.globals.iter().position(|entry| entry.0 == prefix) {
            Some(index) => self.globals[index].1.append(&mut handlers),
            None => self.globals.push((prefix.to_string(), handlers)),
        }
    }

    /// Mount a sub-router at the tree root.
    pub fn mount_root(&mut self, sub: Router) -> Result<(), RouteError> {
        self.mount("/", sub)
    }

    /// Mount a sub-router beneath `prefix`.
    ///
    /// The sub-router's subtrees are attached at the node reached by walking
    /// `prefix`; where this router already has a child under the same
    /// segment the existing subtree is kept and the sub-router's is skipped
    /// (logged, not merged). The sub-router's global middlewares are rebased
    /// under `prefix` and apply to routes registered on this router
    /// afterwards; chains already composed on the sub-router are untouched.
    pub fn mount(&mut self, prefix: &str, sub: Router) -> Result<(), RouteError> {
        let prefix = if prefix.is_empty() { "/" } else { prefix };
        let Router {
            root: sub_root,
            globals: sub_globals,
        } = sub;

        for (key, middlewares) in sub_globals {
            let rebased = join_prefix(prefix, &key);
            match self.globals.iter().position(|entry| entry.0 == rebased) {
                Some(index) => self.globals[index].1.extend(middlewares),
                None => self.globals.push((rebased, middlewares)),
            }
        }

        let mut target = &mut self.root;
        for segment in path::split(prefix) {
            if let Some(name) = path::param_name(segment) {
                if let Some(existing) = &target.param_child {
                    if existing.name.as_ref() != name {
                        return Err(RouteError::ParamConflict {
                            path: prefix.to_string(),
                            existing: existing.name.to_string(),
                            offered: name.to_string(),
                        });
                    }
                }
                let child = target
                    .param_child
                    .get_or_insert_with(|| Box::new(ParamChild::new(name)));
                target = &mut child.node;
            } else {
                target = target
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(RouteNode::new);
            }
        }

        for (key, node) in sub_root.children {
            match target.children.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(node);
                }
                Entry::Occupied(entry) => {
                    warn!(
                        prefix,
                        segment = %entry.key(),
                        "mount skipped a subtree that already exists on the parent"
                    );
                }
            }
        }
        if let Some(param_child) = sub_root.param_child {
            if target.param_child.is_none() {
                target.param_child = Some(param_child);
            } else {
                warn!(
                    prefix,
                    parameter = %param_child.name,
                    "mount skipped a parameter subtree that already exists on the parent"
                );
            }
        }
        Ok(())
    }

    /// Resolve a request path and method to a handler chain.
    ///
    /// Literal children win over the parameter child at every depth, so the
    /// result does not depend on registration order of sibling routes.
    /// Fails with `not-found` when no endpoint matches the path and with
    /// `method-not-allowed` when the endpoint exists but the method was
    /// never registered; both carry a `Cannot {METHOD} {path}` message.
    pub fn search(&self, method: &Method, target: &str) -> Result<RouteMatch, HttpError> {
        let tokens = path::split(target);

        let mut current = &self.root;
        if tokens.is_empty() {
            current = match current.children.get("/") {
                Some(node) => node,
                None => return Err(miss(method, target)),
            };
        } else {
            for token in &tokens {
                if let Some(child) = current.children.get(*token) {
                    current = child;
                } else if let Some(param_child) = &current.param_child {
                    current = &param_child.node;
                } else {
                    return Err(miss(method, target));
                }
            }
        }

        if !current.endpoint {
            return Err(miss(method, target));
        }
        let handlers = match current.methods.get(method) {
            Some(handlers) => handlers,
            None => {
                debug!(method = %method, path = target, "endpoint hit but method unregistered");
                return Err(HttpError::method_not_allowed(format!(
                    "Cannot {method} {target}"
                )));
            }
        };

        let mut params = HashMap::new();
        if let Some(slots) = current.param_slots.get(method) {
            for (index, name) in slots {
                if let Some(value) = tokens.get(*index) {
                    params.insert(name.to_string(), (*value).to_string());
                }
            }
        }

        debug!(
            method = %method,
            path = target,
            handlers = handlers.len(),
            params = ?params,
            "route matched"
        );

        Ok(RouteMatch {
            handlers: handlers.clone(),
            params,
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn miss(method: &Method, target: &str) -> HttpError {
    debug!(method = %method, path = target, "no route matched");
    HttpError::not_found(format!("Cannot {method} {target}"))
}

/// Rebase a sub-router global-middleware key under a mount prefix,
/// normalized to a single leading slash.
fn join_prefix(prefix: &str, key: &str) -> String {
    let base = prefix.trim_end_matches('/');
    let rest = key.trim_start_matches('/');
    let joined = if rest.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{rest}")
    };
    if joined.is_empty() {
        "/".to_string()
    } else if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}
