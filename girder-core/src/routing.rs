// Route table and path matching

use crate::context::Params;
use crate::handler::{HandlerFunc, MiddlewareFunc, apply_middleware};
use crate::logging::trace;
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered route.
///
/// Keeps the middleware it was registered with and the handler already
/// wrapped in that middleware.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path: String,
    middleware: Arc<[MiddlewareFunc]>,
    handler: HandlerFunc,
    chain: HandlerFunc,
}

impl Route {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        handler: HandlerFunc,
        middleware: Vec<MiddlewareFunc>,
    ) -> Self {
        let chain = apply_middleware(Arc::clone(&handler), &middleware);
        Self {
            method,
            path: path.into(),
            middleware: middleware.into(),
            handler,
            chain,
        }
    }

    /// Middleware captured at registration, outermost first.
    pub fn middleware(&self) -> &[MiddlewareFunc] {
        &self.middleware
    }

    /// The handler without its middleware.
    pub fn handler(&self) -> &HandlerFunc {
        &self.handler
    }

    /// The handler wrapped in its middleware.
    pub fn chain(&self) -> &HandlerFunc {
        &self.chain
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Routes indexed by method.
///
/// Patterns are matched character by character: `:name` captures up to the
/// next `/`, and a trailing `*` captures the rest of the path (possibly
/// empty) as the `*` parameter. When several patterns match, the one with
/// the most literal characters wins, then one without a wildcard, then the
/// one registered first.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, replacing any route with the same method and path.
    pub fn add(&mut self, route: Route) {
        trace!(method = %route.method, path = %route.path, "registering route");
        let table = self.routes.entry(route.method.clone()).or_default();
        match table.iter_mut().find(|r| r.path == route.path) {
            Some(existing) => *existing = route,
            None => table.push(route),
        }
    }

    /// The best route for `method` and `path`, with its captured parameters.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, Params)> {
        let mut best: Option<(&Route, Params, Score)> = None;
        for route in self.routes.get(method)? {
            let Some((params, score)) = match_path(&route.path, path) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, _, top)| score > *top) {
                best = Some((route, params, score));
            }
        }
        best.map(|(route, params, _)| (route, params))
    }

    /// Methods that have a route matching `path`.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .routes
            .iter()
            .filter(|(_, table)| table.iter().any(|r| match_path(&r.path, path).is_some()))
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// The route registered for `method` and exactly `path`.
    pub fn get(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.get(method)?.iter().find(|r| r.path == path)
    }

    /// Every registered route.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.values().flatten().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.len()).finish()
    }
}

/// Literal characters matched, then whether no wildcard was needed.
type Score = (usize, bool);

/// Match a route pattern against a request path.
fn match_path(pattern: &str, path: &str) -> Option<(Params, Score)> {
    let pattern = pattern.as_bytes();
    let path_bytes = path.as_bytes();
    let mut params = Params::new();
    let (mut i, mut j) = (0, 0);
    let mut literal = 0;

    while i < pattern.len() {
        match pattern[i] {
            b'*' if i + 1 == pattern.len() => {
                params.push(("*".to_string(), path[j..].to_string()));
                return Some((params, (literal, false)));
            }
            b':' => {
                let name_end = pattern[i + 1..]
                    .iter()
                    .position(|&b| b == b'/')
                    .map_or(pattern.len(), |n| i + 1 + n);
                let value_end = path_bytes[j..]
                    .iter()
                    .position(|&b| b == b'/')
                    .map_or(path_bytes.len(), |n| j + n);
                if value_end == j {
                    return None;
                }
                let name = std::str::from_utf8(&pattern[i + 1..name_end]).ok()?;
                params.push((name.to_string(), path[j..value_end].to_string()));
                i = name_end;
                j = value_end;
            }
            b => {
                if path_bytes.get(j) != Some(&b) {
                    return None;
                }
                literal += 1;
                i += 1;
                j += 1;
            }
        }
    }

    (j == path_bytes.len()).then_some((params, (literal, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    fn route(method: Method, path: &str) -> Route {
        Route::new(method, path, handler_fn(|_| Ok(())), Vec::new())
    }

    fn param<'p>(params: &'p Params, name: &str) -> Option<&'p str> {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_match_path_static() {
        let (params, score) = match_path("/users", "/users").unwrap();
        assert!(params.is_empty());
        assert_eq!(score, (6, true));
        assert!(match_path("/users", "/users/").is_none());
        assert!(match_path("/users", "/user").is_none());
    }

    #[test]
    fn test_match_path_with_params() {
        let (params, _) = match_path("/users/:user_id/posts/:post_id", "/users/123/posts/456").unwrap();
        assert_eq!(param(&params, "user_id"), Some("123"));
        assert_eq!(param(&params, "post_id"), Some("456"));

        assert!(match_path("/users/:id", "/users/").is_none());
        assert!(match_path("/users/:id", "/posts/123").is_none());
    }

    #[test]
    fn test_match_path_wildcard() {
        let (params, score) = match_path("/api*", "/api/v1/users").unwrap();
        assert_eq!(param(&params, "*"), Some("/v1/users"));
        assert_eq!(score, (4, false));

        let (params, _) = match_path("/api*", "/api").unwrap();
        assert_eq!(param(&params, "*"), Some(""));

        let (params, _) = match_path("*", "/anything").unwrap();
        assert_eq!(param(&params, "*"), Some("/anything"));

        let (params, _) = match_path("/files/:dir/*", "/files/img/a/b.png").unwrap();
        assert_eq!(param(&params, "dir"), Some("img"));
        assert_eq!(param(&params, "*"), Some("a/b.png"));

        assert!(match_path("/api*", "/ap").is_none());
    }

    #[test]
    fn test_priority_static_param_wildcard() {
        let mut router = Router::new();
        router.add(route(Method::GET, "/users*"));
        router.add(route(Method::GET, "/users/:id"));
        router.add(route(Method::GET, "/users/new"));

        let (r, _) = router.find(&Method::GET, "/users/new").unwrap();
        assert_eq!(r.path, "/users/new");

        let (r, params) = router.find(&Method::GET, "/users/7").unwrap();
        assert_eq!(r.path, "/users/:id");
        assert_eq!(param(&params, "id"), Some("7"));

        let (r, _) = router.find(&Method::GET, "/users/7/posts").unwrap();
        assert_eq!(r.path, "/users*");

        assert!(router.find(&Method::POST, "/users/7").is_none());
    }

    #[test]
    fn test_same_method_and_path_replaces() {
        let mut router = Router::new();
        router.add(route(Method::GET, "/a"));
        let replacement = route(Method::GET, "/a");
        let handler = Arc::clone(replacement.handler());
        router.add(replacement);

        assert_eq!(router.len(), 1);
        let stored = router.get(&Method::GET, "/a").unwrap();
        assert!(Arc::ptr_eq(stored.handler(), &handler));
    }

    #[test]
    fn test_allowed_methods() {
        let mut router = Router::new();
        router.add(route(Method::GET, "/items/:id"));
        router.add(route(Method::DELETE, "/items/:id"));
        router.add(route(Method::POST, "/items"));

        assert_eq!(
            router.allowed_methods("/items/3"),
            vec![Method::DELETE, Method::GET]
        );
        assert!(router.allowed_methods("/nothing").is_empty());
    }
}
