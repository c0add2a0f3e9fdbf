//! Route Groups Example
//!
//! Nested groups with inherited middleware:
//! - `/api` logs and tags every request with an id
//! - `/api/admin` additionally requires a bearer token
//! - unmapped paths under a group still run the group's middleware before
//!   answering 404
//!
//! Run with:
//! ```bash
//! cargo run --example route_groups
//! ```
//!
//! Then try:
//! ```bash
//! curl -i localhost:1323/api/users/7
//! curl -i localhost:1323/api/admin/stats
//! curl -i -H 'authorization: Bearer letmein' localhost:1323/api/admin/stats
//! curl -i localhost:1323/api/nowhere
//! ```

use girder::logging::{LogFormat, info};
use girder::middleware::RequestId;
use girder::prelude::*;
use http::StatusCode;
use std::sync::Arc;

fn require_token() -> MiddlewareFunc {
    middleware_fn(|next| {
        handler_fn(move |c| {
            let authorized = c
                .request()
                .header()
                .get("authorization")
                .is_some_and(|v| v == "Bearer letmein");
            if !authorized {
                return Err(Error::http(StatusCode::UNAUTHORIZED, "missing or bad token"));
            }
            next(c)
        })
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = LogConfig::new().format(LogFormat::Pretty).init()?;

    let app = App::new();
    app.get(
        "/",
        handler_fn(|c| c.string(StatusCode::OK, "girder route groups demo")),
        vec![],
    );

    let api = app.group("/api", vec![logger(), request_id()]);
    api.get(
        "/users/:id",
        handler_fn(|c| {
            let id = c.param("id").unwrap_or_default().to_owned();
            let request_id = c.get::<RequestId>().map(|r| r.0.clone());
            c.json(
                StatusCode::OK,
                &serde_json::json!({ "id": id, "request_id": request_id }),
            )
        }),
        vec![],
    );

    let admin = api.group("/admin", vec![require_token()]);
    admin.get(
        "/stats",
        handler_fn(|c| c.json(StatusCode::OK, &serde_json::json!({ "users": 1 }))),
        vec![],
    );

    for route in app.routes() {
        info!(method = %route.method, path = %route.path, "route registered");
    }

    let server = Arc::new(app.into_server(ServerConfig::new("127.0.0.1:1323")));
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
