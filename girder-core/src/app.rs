// Application: route table, global middleware and error handling

use crate::engine::standard::{Request, Response, Server};
use crate::engine::{Handler, ServerConfig};
use crate::handler::{HandlerFunc, MiddlewareFunc, apply_middleware, handler_fn};
use crate::logging::{debug, error, warn};
use crate::routing::{Route, Router};
use crate::{Context, Error, Group};
use http::{Method, header};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::Dispatch;

/// Every method `any` registers.
pub const METHODS: [Method; 9] = [
    Method::CONNECT,
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// Renders an error returned from the handler chain.
pub type ErrorHandler = Arc<dyn Fn(Error, &mut Context<'_>) + Send + Sync>;

struct Inner {
    router: RwLock<Router>,
    middleware: RwLock<Vec<MiddlewareFunc>>,
    error_handler: RwLock<ErrorHandler>,
    logger: RwLock<Option<Dispatch>>,
}

/// The root of an application.
///
/// Owns the route table, the global middleware and the error handler.
/// Cloning yields another handle to the same application, so groups and the
/// server can each keep one.
///
/// # Examples
///
/// ```no_run
/// use girder_core::{App, ServerConfig, handler_fn};
/// use http::StatusCode;
///
/// # async fn example() -> Result<(), girder_core::Error> {
/// let app = App::new();
/// app.get("/hello", handler_fn(|c| c.string(StatusCode::OK, "hello")), vec![]);
///
/// let server = std::sync::Arc::new(app.into_server(ServerConfig::new("127.0.0.1:1323")));
/// server.start().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct App {
    inner: Arc<Inner>,
}

impl App {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                router: RwLock::new(Router::new()),
                middleware: RwLock::new(Vec::new()),
                error_handler: RwLock::new(Arc::new(default_error_handler)),
                logger: RwLock::new(None),
            }),
        }
    }

    /// Add middleware run around every request, matched or not.
    pub fn use_middleware(&self, middleware: Vec<MiddlewareFunc>) {
        self.inner.middleware.write().extend(middleware);
    }

    /// Register `handler` for `method` and `path` behind `middleware`.
    ///
    /// A route already registered for the same method and path is replaced.
    pub fn add(
        &self,
        method: Method,
        path: &str,
        handler: HandlerFunc,
        middleware: Vec<MiddlewareFunc>,
    ) -> Route {
        let route = Route::new(method, path, handler, middleware);
        self.inner.router.write().add(route.clone());
        route
    }

    pub fn connect(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::CONNECT, path, h, m)
    }

    pub fn delete(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::DELETE, path, h, m)
    }

    pub fn get(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::GET, path, h, m)
    }

    pub fn head(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::HEAD, path, h, m)
    }

    pub fn options(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::OPTIONS, path, h, m)
    }

    pub fn patch(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::PATCH, path, h, m)
    }

    pub fn post(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::POST, path, h, m)
    }

    pub fn put(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::PUT, path, h, m)
    }

    pub fn trace(&self, path: &str, h: HandlerFunc, m: Vec<MiddlewareFunc>) -> Route {
        self.add(Method::TRACE, path, h, m)
    }

    /// Register `handler` for every method in [`METHODS`].
    pub fn any(&self, path: &str, handler: HandlerFunc, middleware: Vec<MiddlewareFunc>) -> Vec<Route> {
        self.match_methods(&METHODS, path, handler, middleware)
    }

    /// Register `handler` for each of `methods`.
    pub fn match_methods(
        &self,
        methods: &[Method],
        path: &str,
        handler: HandlerFunc,
        middleware: Vec<MiddlewareFunc>,
    ) -> Vec<Route> {
        methods
            .iter()
            .map(|m| self.add(m.clone(), path, Arc::clone(&handler), middleware.clone()))
            .collect()
    }

    /// Create a group under `prefix`. Its catch-all route is registered
    /// right away, even when `middleware` is empty.
    pub fn group(&self, prefix: &str, middleware: Vec<MiddlewareFunc>) -> Group {
        let mut group = Group::new(prefix, self.clone());
        group.use_middleware(middleware);
        group
    }

    /// Every registered route.
    pub fn routes(&self) -> Vec<Route> {
        self.inner.router.read().routes()
    }

    /// The route registered for exactly `method` and `path`.
    pub fn route(&self, method: &Method, path: &str) -> Option<Route> {
        self.inner.router.read().get(method, path).cloned()
    }

    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(Error, &mut Context<'_>) + Send + Sync + 'static,
    {
        *self.inner.error_handler.write() = Arc::new(handler);
    }

    /// Subscriber passed on to servers built with [`into_server`](Self::into_server).
    pub fn set_logger(&self, logger: Dispatch) {
        *self.inner.logger.write() = Some(logger);
    }

    pub fn logger(&self) -> Option<Dispatch> {
        self.inner.logger.read().clone()
    }

    /// Build a server that dispatches every request to this application.
    pub fn into_server(self, config: ServerConfig) -> Server {
        let server = Server::with_config(config);
        if let Some(logger) = self.logger() {
            server.set_logger(logger);
        }
        server.set_handler(self);
        server
    }

    fn resolve(&self, c: &mut Context<'_>, method: &Method, path: &str) -> HandlerFunc {
        let router = self.inner.router.read();
        if let Some((route, params)) = router.find(method, path) {
            c.set_route(&route.path, params);
            return Arc::clone(route.chain());
        }

        let allowed = router.allowed_methods(path);
        if allowed.is_empty() {
            return handler_fn(|_| Err(Error::not_found()));
        }

        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        handler_fn(move |c| {
            c.response().header().set(header::ALLOW.as_str(), &allow)?;
            Err(Error::MethodNotAllowed(allow.clone()))
        })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("router", &*self.inner.router.read())
            .field("middleware", &self.inner.middleware.read().len())
            .finish_non_exhaustive()
    }
}

impl Handler for App {
    fn serve(&self, req: &Request, res: &Response) {
        let method = req.method();
        let path = req.url().path();
        let mut c = Context::new(req, res);

        let handler = self.resolve(&mut c, &method, &path);
        let global = self.inner.middleware.read().clone();
        let chain = apply_middleware(handler, &global);

        debug!(method = %method, path = %path, route = %c.path(), "dispatching request");

        if let Err(err) = chain(&mut c) {
            let error_handler = Arc::clone(&*self.inner.error_handler.read());
            error_handler(err, &mut c);
        }
    }
}

/// Log the error and, unless the response is already committed, answer with
/// its status and a JSON body.
pub fn default_error_handler(err: Error, c: &mut Context<'_>) {
    let status = err.status_code();
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %err, "request failed");
    } else {
        debug!(status = status.as_u16(), error = %err, "request rejected");
    }

    if c.response().committed() {
        return;
    }

    let body = serde_json::json!({
        "error": err.to_string(),
        "status": status.as_u16(),
    });
    if let Err(e) = c.json(status, &body) {
        warn!(error = %e, "failed to write error response");
    }
}
