use std::sync::Arc;

use crate::error::HttpError;
use crate::http::{Request, Response};

use super::chain::Chain;

/// Shared handle to a handler, as stored in route chains.
pub type ArcHandler = Arc<dyn Handler>;

/// Shared handle to an error handler.
pub type ArcErrorHandler = Arc<dyn ErrorHandler>;

/// A middleware step in a request chain.
///
/// A handler must either produce a terminal write on the response and not
/// call `next`, or call [`Chain::next`] at most once to hand control to the
/// rest of the chain. Returning an error routes control to the chain's
/// error handler.
///
/// Closures of the matching shape implement the trait directly:
///
/// ```rust,ignore
/// router.get("/ping", |_req: &mut Request, res: &mut Response, _next: &mut Chain| {
///     res.send("pong")
/// })?;
/// ```
pub trait Handler: Send + Sync + 'static {
    fn handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        next: &mut Chain,
    ) -> Result<(), HttpError>;
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response, &mut Chain) -> Result<(), HttpError>
        + Send
        + Sync
        + 'static,
{
    fn handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        next: &mut Chain,
    ) -> Result<(), HttpError> {
        self(req, res, next)
    }
}

/// The catching side of a chain, invoked with the error a handler raised.
///
/// An error returned from the error handler itself propagates out of the
/// chain to the acceptor.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(
        &self,
        err: HttpError,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<(), HttpError>;
}

impl<F> ErrorHandler for F
where
    F: Fn(HttpError, &mut Request, &mut Response) -> Result<(), HttpError> + Send + Sync + 'static,
{
    fn handle(
        &self,
        err: HttpError,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<(), HttpError> {
        self(err, req, res)
    }
}

/// Conversion of a registration argument into an ordered handler list.
///
/// Route and middleware registration accept a single handler, a tuple of
/// two to five handlers, or an explicit `Vec<ArcHandler>`:
///
/// ```rust,ignore
/// router.get("/one", done)?;
/// router.get("/two", (auth, done))?;
/// router.get("/many", vec![handler(auth), handler(done)])?;
/// ```
///
/// The marker parameter keeps the three impl families from overlapping; it
/// is always inferred and never written at call sites.
pub trait IntoHandlers<M> {
    fn into_handlers(self) -> Vec<ArcHandler>;
}

/// Marker for the single-handler [`IntoHandlers`] impl.
pub struct SingleHandler;

/// Marker for the `Vec<ArcHandler>` [`IntoHandlers`] impl.
pub struct HandlerVec;

/// Marker for the tuple [`IntoHandlers`] impls.
pub struct HandlerTuple;

impl<H: Handler> IntoHandlers<SingleHandler> for H {
    fn into_handlers(self) -> Vec<ArcHandler> {
        vec![Arc::new(self)]
    }
}

impl IntoHandlers<HandlerVec> for Vec<ArcHandler> {
    fn into_handlers(self) -> Vec<ArcHandler> {
        self
    }
}

macro_rules! tuple_into_handlers {
    ($($name:ident),+) => {
        impl<$($name: Handler),+> IntoHandlers<HandlerTuple> for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_handlers(self) -> Vec<ArcHandler> {
                let ($($name,)+) = self;
                vec![$(Arc::new($name) as ArcHandler),+]
            }
        }
    };
}

tuple_into_handlers!(A, B);
tuple_into_handlers!(A, B, C);
tuple_into_handlers!(A, B, C, D);
tuple_into_handlers!(A, B, C, D, E);

/// Box a handler for use in an explicit handler list.
pub fn handler(h: impl Handler) -> ArcHandler {
    Arc::new(h)
}

/// Media type of a Content-Type header value, without parameters.
pub(crate) fn media_type(value: &str) -> &str {
    match value.split_once(';') {
        Some((media, _params)) => media.trim(),
        None => value.trim(),
    }
}
