// Native handler and middleware interop

use crate::engine::native::{NativeHandler, NativeMiddleware, NativeRequest, ResponseWriter};
use crate::logging::warn;
use crate::{Context, Error, HandlerFunc, MiddlewareFunc, handler_fn, middleware_fn};
use std::cell::RefCell;
use std::sync::Arc;

fn unbound() -> Error {
    Error::Internal("request or response is not bound to a transport".to_string())
}

/// Run a native handler as a framework handler.
///
/// The native handler writes through the response's adapter, so the
/// response's commit state and size stay accurate. It has no way to report
/// failure: the wrapped handler always returns `Ok(())` once it ran.
pub fn wrap_handler<H>(handler: H) -> HandlerFunc
where
    H: NativeHandler + Send + Sync + 'static,
{
    handler_fn(move |c| {
        let (Some(adapter), Some(native)) = (c.response().adapter(), c.request().native()) else {
            return Err(unbound());
        };
        handler.serve_http(adapter, native);
        Ok(())
    })
}

/// Run a native middleware as a framework middleware.
///
/// The native middleware receives the raw transport writer and request. When
/// it calls the handler it was given, the rest of the framework chain runs;
/// the chain's result is returned once the native middleware finishes, or
/// `Ok(())` if it never called through.
pub fn wrap_middleware<M>(middleware: M) -> MiddlewareFunc
where
    M: NativeMiddleware + 'static,
{
    let middleware = Arc::new(middleware);
    middleware_fn(move |next| {
        let middleware = Arc::clone(&middleware);
        handler_fn(move |c| {
            let (Some(writer), Some(native)) = (
                c.response().writer().cloned(),
                c.request().native().cloned(),
            ) else {
                return Err(unbound());
            };

            let inner = CaptureNext {
                next: &next,
                ctx: RefCell::new(c),
                result: RefCell::new(None),
            };
            let wrapped = middleware.wrap(&inner);
            wrapped.serve_http(&writer, &native);
            drop(wrapped);

            inner.result.into_inner().unwrap_or(Ok(()))
        })
    })
}

/// Native handler standing in for the rest of the framework chain.
struct CaptureNext<'n, 'c, 'a> {
    next: &'n HandlerFunc,
    ctx: RefCell<&'c mut Context<'a>>,
    result: RefCell<Option<Result<(), Error>>>,
}

impl NativeHandler for CaptureNext<'_, '_, '_> {
    fn serve_http(&self, _w: &dyn ResponseWriter, _r: &NativeRequest) {
        let Ok(mut ctx) = self.ctx.try_borrow_mut() else {
            warn!("native middleware re-entered the next handler");
            return;
        };
        let result = (self.next)(&mut **ctx);
        *self.result.borrow_mut() = Some(result);
    }
}
