//! End-to-end workflows through the public facade

use girder::prelude::*;
use http::{Method, StatusCode, Uri};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn serve(server: &Server, method: Method, uri: &'static str) -> NativeResponse {
    let res = NativeResponse::new();
    server.serve_http(&res, &NativeRequest::new(method, Uri::from_static(uri)));
    res
}

#[test]
fn test_versioned_api_workflow() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let count = middleware_fn(move |next| {
        let counter = Arc::clone(&counter);
        handler_fn(move |c| {
            counter.fetch_add(1, Ordering::SeqCst);
            next(c)
        })
    });

    let app = App::new();
    let api = app.group("/api", vec![count, request_id()]);
    let v1 = api.group("/v1", vec![]);
    v1.get(
        "/users",
        handler_fn(|c| c.json(StatusCode::OK, &serde_json::json!(["ada", "grace"]))),
        vec![],
    );

    let server = app.into_server(ServerConfig::new("127.0.0.1:0"));

    let res = serve(&server, Method::GET, "/api/v1/users");
    assert_eq!(res.status(), Some(StatusCode::OK));
    assert!(res.headers().read().contains_key("x-request-id"));
    let body: serde_json::Value = serde_json::from_slice(&res.body()).unwrap();
    assert_eq!(body, serde_json::json!(["ada", "grace"]));

    let res = serve(&server, Method::DELETE, "/api/v1/nothing");
    assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(server.pools().in_use(), 0);
}

#[test]
fn test_native_and_framework_handlers_share_a_server() {
    let app = App::new();
    app.get(
        "/native",
        wrap_handler(|w: &dyn ResponseWriter, _: &NativeRequest| {
            let _ = w.write(b"native");
        }),
        vec![],
    );
    app.get("/framework", handler_fn(|c| c.string(StatusCode::OK, "framework")), vec![]);

    let server = app.into_server(ServerConfig::default());
    assert_eq!(&serve(&server, Method::GET, "/native").body()[..], b"native");
    assert_eq!(&serve(&server, Method::GET, "/framework").body()[..], b"framework");
}
