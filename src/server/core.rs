use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use http::Method;
use may::coroutine::JoinHandle;
use may::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::middleware::{ArcErrorHandler, ErrorHandler, IntoHandlers};
use crate::router::{RouteError, Router};

use super::pool::{ConnPool, PoolMetrics};

/// State shared by the accept loop and the connection workers, frozen when
/// the server starts.
pub(crate) struct ServerShared {
    pub(crate) router: Router,
    pub(crate) error_handler: Option<ArcErrorHandler>,
    pub(crate) config: ServerConfig,
}

/// The application: a router, an optional top-level error handler and the
/// connection acceptor.
///
/// Configure routes and middleware first, then hand the server to
/// [`Server::listen`] or [`Server::start`]; both consume it, so the routing
/// tables cannot change while requests are in flight.
///
/// ```rust,ignore
/// let mut app = Server::new();
/// app.middleware(AccessLog);
/// app.get("/hello/:name", |req: &mut Request, res: &mut Response, _next: &mut Chain| {
///     res.send(format!("hello {}", req.param("name").unwrap_or("world")))
/// })?;
/// app.listen(3000)?;
/// ```
pub struct Server {
    router: Router,
    error_handler: Option<ArcErrorHandler>,
    config: ServerConfig,
}

impl Server {
    /// Server configured from `TRELLIS_*` environment variables.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::from_env())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            router: Router::new(),
            error_handler: None,
            config,
        }
    }

    pub fn get<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.router.get(pattern, handlers)
    }

    pub fn post<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.router.post(pattern, handlers)
    }

    pub fn put<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.router.put(pattern, handlers)
    }

    pub fn patch<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.router.patch(pattern, handlers)
    }

    pub fn delete<M>(
        &mut self,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.router.delete(pattern, handlers)
    }

    /// Register handlers for an arbitrary method.
    pub fn route<M>(
        &mut self,
        method: Method,
        pattern: &str,
        handlers: impl IntoHandlers<M>,
    ) -> Result<(), RouteError> {
        self.router.route(method, pattern, handlers)
    }

    /// Global middleware for every subsequently registered route.
    pub fn middleware<M>(&mut self, handlers: impl IntoHandlers<M>) {
        self.router.middleware(handlers);
    }

    /// Global middleware for subsequently registered routes under `prefix`.
    pub fn middleware_at<M>(&mut self, prefix: &str, handlers: impl IntoHandlers<M>) {
        self.router.middleware_at(prefix, handlers);
    }

    /// Mount a sub-router beneath `prefix`.
    pub fn mount(&mut self, prefix: &str, sub: Router) -> Result<(), RouteError> {
        self.router.mount(prefix, sub)
    }

    /// Mount a sub-router at the root.
    pub fn mount_root(&mut self, sub: Router) -> Result<(), RouteError> {
        self.router.mount_root(sub)
    }

    /// Install the top-level error handler. A later call replaces it.
    pub fn error_handler(&mut self, handler: impl ErrorHandler) {
        self.error_handler = Some(Arc::new(handler));
    }

    /// Bind the listener, spawn the worker pool once, and run the accept
    /// loop on a coroutine. Returns a handle for readiness and shutdown.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;

        let shared = Arc::new(ServerShared {
            router: self.router,
            error_handler: self.error_handler,
            config: self.config,
        });
        let stack_size = shared.config.stack_size;

        let pool = unsafe { ConnPool::new(Arc::clone(&shared)) };
        let metrics = pool.metrics();

        let handle = unsafe {
            may::coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    info!(addr = %addr, "server listening");
                    loop {
                        match listener.accept() {
                            Ok((stream, peer)) => {
                                debug!(peer = %peer, "connection accepted");
                                if pool.dispatch(stream).is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                error!(error = %err, "accept failed");
                            }
                        }
                    }
                })?
        };

        Ok(ServerHandle {
            addr,
            handle,
            metrics,
        })
    }

    /// Serve on `0.0.0.0:port` until the accept loop exits.
    pub fn listen(self, port: u16) -> io::Result<()> {
        let handle = self.start(("0.0.0.0", port))?;
        handle.join()
    }

    /// Like [`Server::listen`], running `on_start` once the port is bound.
    pub fn listen_with(self, port: u16, on_start: impl FnOnce()) -> io::Result<()> {
        let handle = self.start(("0.0.0.0", port))?;
        on_start();
        handle.join()
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    metrics: Arc<PoolMetrics>,
}

impl ServerHandle {
    /// The bound address, useful with port 0.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Worker pool counters.
    pub fn pool_metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Block until the listener answers connections.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if std::net::TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting, close the listener and drain the pool.
    pub fn stop(self) {
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Wait for the accept loop to exit.
    pub fn join(self) -> io::Result<()> {
        self.handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "server coroutine panicked"))
    }
}
