// Built-in middleware

use crate::handler::{MiddlewareFunc, handler_fn, middleware_fn};
use crate::logging::{error, info};
use std::time::Instant;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned by [`request_id`], readable with `Context::get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Log every request and its outcome.
pub fn logger() -> MiddlewareFunc {
    middleware_fn(|next| {
        handler_fn(move |c| {
            let start = Instant::now();
            let req = c.request();
            let method = req.method();
            let uri = req.uri();
            let remote = req.remote_address();

            let result = next(&mut *c);
            let duration = start.elapsed();

            match &result {
                Ok(()) => info!(
                    method = %method,
                    uri = %uri,
                    remote = %remote,
                    status = c.response().status().as_u16(),
                    size = c.response().size(),
                    duration_ms = duration.as_millis(),
                    "HTTP response sent"
                ),
                Err(err) => error!(
                    method = %method,
                    uri = %uri,
                    remote = %remote,
                    duration_ms = duration.as_millis(),
                    error = %err,
                    "HTTP request failed"
                ),
            }

            result
        })
    })
}

/// Reuse the client's `x-request-id` or generate one, echo it on the
/// response and expose it to later handlers as [`RequestId`].
pub fn request_id() -> MiddlewareFunc {
    middleware_fn(|next| {
        handler_fn(move |c| {
            let id = c
                .request()
                .header()
                .get(REQUEST_ID_HEADER)
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            c.response().header().set(REQUEST_ID_HEADER, &id)?;
            c.set(RequestId(id));
            next(c)
        })
    })
}
