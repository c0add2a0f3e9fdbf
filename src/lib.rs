// Girder - pooled request/response adaptation over hyper with hierarchical
// route groups and inherited middleware.
//
// This crate re-exports `girder-core` and adds a prelude.

// Re-export core functionality
pub use girder_core::*;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        App,
        Context,
        Error,
        Group,
        Handler,
        HandlerFunc,
        MiddlewareFunc,
        // Native interop
        NativeHandler,
        NativeMiddleware,
        NativeRequest,
        NativeResponse,
        Request,
        Response,
        ResponseWriter,
        Route,
        Server,
        ServerConfig,
        handler_fn,
        middleware_fn,
        wrap_handler,
        wrap_middleware,
    };
    pub use crate::logging::LogConfig;
    pub use crate::middleware::{logger, request_id};
}
