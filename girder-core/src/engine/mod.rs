//! Transport engine.
//!
//! `native` holds the transport's own request/response primitives,
//! `standard` the hyper-backed server that adapts them into the pooled
//! [`Request`](standard::Request) and [`Response`](standard::Response)
//! wrappers handed to the top-level [`Handler`].

pub mod config;
pub mod native;
pub mod standard;
pub mod tls;

pub use config::ServerConfig;
pub use standard::{Request, Response};

/// The single top-level handler a server dispatches every request to.
pub trait Handler: Send + Sync {
    fn serve(&self, req: &Request, res: &Response);
}

impl<F> Handler for F
where
    F: Fn(&Request, &Response) + Send + Sync,
{
    fn serve(&self, req: &Request, res: &Response) {
        self(req, res)
    }
}
