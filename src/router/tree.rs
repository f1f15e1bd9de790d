//! Route tree nodes.
//!
//! Each node holds its literal children in a map keyed by the exact segment
//! and at most one parameter child in a dedicated slot, so literal-beats-
//! parameter precedence is structural rather than a property of scan order.
//! Endpoint nodes additionally carry, per HTTP method, the ordered handler
//! list and the `(segment index, parameter name)` slots captured along the
//! registration path.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;

use crate::middleware::ArcHandler;

/// Parameter slots per route before the list spills to the heap. Deeply
/// parameterized routes beyond this are rare enough not to matter.
pub(crate) const MAX_INLINE_PARAMS: usize = 8;

/// Ordered `(segment index, parameter name)` pairs for one registered route.
pub(crate) type ParamSlots = SmallVec<[(usize, Arc<str>); MAX_INLINE_PARAMS]>;

pub(crate) struct RouteNode {
    /// Literal children, keyed by exact segment.
    pub(crate) children: HashMap<String, RouteNode>,
    /// The single parameter child, if any.
    pub(crate) param_child: Option<Box<ParamChild>>,
    /// Ordered handler chains per registered method.
    pub(crate) methods: HashMap<Method, Vec<ArcHandler>>,
    /// Parameter slots per registered method.
    pub(crate) param_slots: HashMap<Method, ParamSlots>,
    /// True once at least one method is registered here.
    pub(crate) endpoint: bool,
}

pub(crate) struct ParamChild {
    pub(crate) name: Arc<str>,
    pub(crate) node: RouteNode,
}

impl RouteNode {
    pub(crate) fn new() -> Self {
        Self {
            children: HashMap::new(),
            param_child: None,
            methods: HashMap::new(),
            param_slots: HashMap::new(),
            endpoint: false,
        }
    }

    pub(crate) fn supports(&self, method: &Method) -> bool {
        self.methods.contains_key(method)
    }
}

impl ParamChild {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            node: RouteNode::new(),
        }
    }
}
