//! hyper-backed engine with pooled request/response wrappers.

mod header;
mod interop;
mod pool;
mod request;
mod response;
mod server;
mod url;

pub use header::Header;
pub use interop::{wrap_handler, wrap_middleware};
pub use pool::{Pool, PoolStats, Pools};
pub use request::Request;
pub use response::{Response, ResponseAdapter};
pub use server::Server;
pub use url::Url;
