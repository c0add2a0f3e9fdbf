//! Route groups.
//!
//! A [`Group`] is a view onto an [`App`] that prepends a path prefix and a
//! middleware list to everything registered through it. It stores no routes
//! of its own: every registration lands in the application's route table.
//!
//! # Examples
//!
//! ```no_run
//! use girder_core::{App, handler_fn, middleware_fn};
//! use http::StatusCode;
//!
//! let app = App::new();
//! let auth = middleware_fn(|next| next);
//!
//! let api = app.group("/api", vec![auth]);
//! let v1 = api.group("/v1", vec![]);
//! v1.get("/users", handler_fn(|c| c.string(StatusCode::OK, "users")), vec![]);
//! // GET /api/v1/users runs `auth`, then the handler
//! ```
//!
//! Adding middleware to a group also registers a catch-all route,
//! `prefix + "*"`, for every method. Requests under the prefix that match no
//! other route still pass through the group's middleware before failing with
//! `404 Not Found`.

use crate::app::{App, METHODS};
use crate::handler::{HandlerFunc, MiddlewareFunc, handler_fn};
use crate::logging::trace;
use crate::routing::Route;
use crate::Error;
use http::Method;
use std::fmt;

/// A prefix- and middleware-scoped view of an [`App`].
#[derive(Clone)]
pub struct Group {
    prefix: String,
    middleware: Vec<MiddlewareFunc>,
    app: App,
}

impl Group {
    pub(crate) fn new(prefix: &str, app: App) -> Self {
        Self {
            prefix: prefix.to_owned(),
            middleware: Vec::new(),
            app,
        }
    }

    /// Path prefix prepended to every route of this group
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Middleware applied to every route of this group, outermost first
    pub fn middleware(&self) -> &[MiddlewareFunc] {
        &self.middleware
    }

    /// Append middleware and (re)register the group's catch-all route.
    ///
    /// The catch-all carries the group's complete middleware list as it is
    /// after this call, replacing the one registered before.
    pub fn use_middleware(&mut self, middleware: Vec<MiddlewareFunc>) {
        self.middleware.extend(middleware);

        let catch_all = format!("{}*", self.prefix);
        trace!(
            path = %catch_all,
            middleware = self.middleware.len(),
            "registering group catch-all"
        );
        self.app.any(
            &catch_all,
            handler_fn(|_| Err(Error::not_found())),
            self.middleware.clone(),
        );
    }

    /// Register a route under the group's prefix, behind the group's
    /// middleware followed by `middleware`.
    pub fn add(
        &self,
        method: Method,
        path: &str,
        handler: HandlerFunc,
        middleware: Vec<MiddlewareFunc>,
    ) -> Route {
        let mut chain = Vec::with_capacity(self.middleware.len() + middleware.len());
        chain.extend(self.middleware.iter().cloned());
        chain.extend(middleware);
        self.app
            .add(method, &format!("{}{}", self.prefix, path), handler, chain)
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

    /// Register `handler` for every standard method.
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
            .map(|m| self.add(m.clone(), path, handler.clone(), middleware.clone()))
            .collect()
    }

    /// Create a child group. Its prefix and middleware extend this group's.
    pub fn group(&self, prefix: &str, middleware: Vec<MiddlewareFunc>) -> Group {
        let mut chain = Vec::with_capacity(self.middleware.len() + middleware.len());
        chain.extend(self.middleware.iter().cloned());
        chain.extend(middleware);
        self.app.group(&format!("{}{}", self.prefix, prefix), chain)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
