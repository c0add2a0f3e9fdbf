// Core library for the Girder HTTP framework
// Pooled request/response adaptation, routing, route groups and middleware

pub mod app;
pub mod context;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logging;
pub mod middleware;
pub mod route_group;
pub mod routing;

// Re-export commonly used types
pub use app::{App, ErrorHandler, METHODS, default_error_handler};
pub use context::{Context, Params};
pub use engine::native::{
    NativeHandler, NativeHeaders, NativeMiddleware, NativeRequest, NativeResponse, NativeUrl,
    ResponseWriter,
};
pub use engine::standard::{
    Header, Pool, PoolStats, Pools, Request, Response, ResponseAdapter, Server, Url,
    wrap_handler, wrap_middleware,
};
pub use engine::tls::TlsConfig;
pub use engine::{Handler, ServerConfig};
pub use error::*;
pub use handler::*;
pub use route_group::Group;
pub use routing::{Route, Router};
