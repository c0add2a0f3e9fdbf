// Framework handler and middleware types

use crate::{Context, Error};
use std::sync::Arc;

/// A framework handler.
pub type HandlerFunc = Arc<dyn Fn(&mut Context<'_>) -> Result<(), Error> + Send + Sync>;

/// A framework middleware: takes the next handler and returns the handler that
/// wraps it.
pub type MiddlewareFunc = Arc<dyn Fn(HandlerFunc) -> HandlerFunc + Send + Sync>;

/// Box a closure as a [`HandlerFunc`].
pub fn handler_fn<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context<'_>) -> Result<(), Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure as a [`MiddlewareFunc`].
///
/// ```ignore
/// let auth = middleware_fn(|next| {
///     handler_fn(move |c| {
///         if c.request().header().contains("authorization") {
///             next(c)
///         } else {
///             Err(Error::Unauthorized("missing credentials".into()))
///         }
///     })
/// });
/// ```
pub fn middleware_fn<F>(f: F) -> MiddlewareFunc
where
    F: Fn(HandlerFunc) -> HandlerFunc + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap `handler` in `middleware`. The first element ends up outermost.
pub fn apply_middleware(handler: HandlerFunc, middleware: &[MiddlewareFunc]) -> HandlerFunc {
    middleware
        .iter()
        .rev()
        .fold(handler, |next, mw| mw(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::standard::{Request, Response};
    use parking_lot::Mutex;

    fn tag(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> MiddlewareFunc {
        let log = Arc::clone(log);
        middleware_fn(move |next| {
            let log = Arc::clone(&log);
            handler_fn(move |c| {
                log.lock().push(name);
                next(c)
            })
        })
    }

    #[test]
    fn test_first_middleware_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&log);
        let handler = handler_fn(move |_| {
            inner.lock().push("handler");
            Ok(())
        });

        let chain = apply_middleware(handler, &[tag(&log, "a"), tag(&log, "b"), tag(&log, "c")]);
        let (req, res) = (Request::default(), Response::default());
        chain(&mut Context::new(&req, &res)).unwrap();

        assert_eq!(*log.lock(), vec!["a", "b", "c", "handler"]);
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let stop = middleware_fn(|_next| handler_fn(|_| Err(Error::Forbidden("stop".into()))));
        let chain = apply_middleware(handler_fn(|_| Ok(())), &[stop]);

        let (req, res) = (Request::default(), Response::default());
        let err = chain(&mut Context::new(&req, &res)).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }
}
