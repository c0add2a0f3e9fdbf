//! Native Interop Example
//!
//! Mounts plain `(writer, request)` handlers and middleware next to
//! framework handlers.
//!
//! Run with:
//! ```bash
//! cargo run --example native_interop
//! ```

use girder::logging::info;
use girder::prelude::*;
use http::{HeaderValue, StatusCode, header};
use std::sync::Arc;

/// Stamps a `server` header on every response it passes through.
struct PoweredBy;

impl NativeMiddleware for PoweredBy {
    fn wrap<'a>(&self, next: &'a dyn NativeHandler) -> Box<dyn NativeHandler + 'a> {
        Box::new(move |w: &dyn ResponseWriter, r: &NativeRequest| {
            w.headers()
                .write()
                .insert(header::SERVER, HeaderValue::from_static("girder"));
            next.serve_http(w, r);
        })
    }
}

fn health(w: &dyn ResponseWriter, _: &NativeRequest) {
    w.headers()
        .write()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    w.write_header(StatusCode::OK);
    let _ = w.write(b"ok");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = LogConfig::new().init()?;

    let app = App::new();
    app.use_middleware(vec![wrap_middleware(PoweredBy), logger()]);

    app.get("/health", wrap_handler(health), vec![]);
    app.get(
        "/hello/:name",
        handler_fn(|c| {
            let name = c.param("name").unwrap_or("world").to_owned();
            c.string(StatusCode::OK, &format!("hello, {name}"))
        }),
        vec![],
    );

    let mut config = ServerConfig::from_env()?;
    if config.address.is_empty() {
        config.address = "127.0.0.1:1323".to_owned();
    }
    let server = Arc::new(app.into_server(config));
    info!(address = %server.address(), "listening");

    let shutdown = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.stop();
        }
    });

    server.start().await?;
    Ok(())
}
