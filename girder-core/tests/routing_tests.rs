use girder_core::{App, NativeRequest, NativeResponse, ResponseWriter, ServerConfig, handler_fn};
use http::{HeaderValue, Method, StatusCode, Uri, header};

fn serve(app: &App, req: NativeRequest) -> NativeResponse {
    let server = app.clone().into_server(ServerConfig::new("127.0.0.1:0"));
    let res = NativeResponse::new();
    server.serve_http(&res, &req);
    res
}

fn get(uri: &'static str) -> NativeRequest {
    NativeRequest::new(Method::GET, Uri::from_static(uri))
}

#[test]
fn test_wildcard_param() {
    let app = App::new();
    app.get(
        "/static/*",
        handler_fn(|c| {
            let rest = c.param("*").unwrap_or_default().to_owned();
            c.string(StatusCode::OK, &rest)
        }),
        vec![],
    );

    let res = serve(&app, get("/static/css/site.css"));
    assert_eq!(&res.body()[..], b"css/site.css");
}

#[test]
fn test_reregistering_route_replaces_handler() {
    let app = App::new();
    app.get("/v", handler_fn(|c| c.string(StatusCode::OK, "one")), vec![]);
    assert_eq!(&serve(&app, get("/v")).body()[..], b"one");

    app.get("/v", handler_fn(|c| c.string(StatusCode::OK, "two")), vec![]);
    assert_eq!(&serve(&app, get("/v")).body()[..], b"two");
    assert_eq!(app.routes().len(), 1);
}

#[test]
fn test_query_and_form_values() {
    let app = App::new();
    app.post(
        "/search",
        handler_fn(|c| {
            let q = c.query_param("q").unwrap_or_default();
            let page = c.form_value("page").unwrap_or_default();
            c.json(
                StatusCode::OK,
                &serde_json::json!({ "q": q, "page": page }),
            )
        }),
        vec![],
    );

    let req = NativeRequest::new(Method::POST, Uri::from_static("/search?q=rust"))
        .with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        )
        .with_body("page=3");
    let res = serve(&app, req);

    assert_eq!(res.headers().read()[header::CONTENT_TYPE], "application/json");
    let body: serde_json::Value = serde_json::from_slice(&res.body()).unwrap();
    assert_eq!(body["q"], "rust");
    assert_eq!(body["page"], "3");
}

#[test]
fn test_redirect() {
    let app = App::new();
    app.get(
        "/old",
        handler_fn(|c| c.redirect(StatusCode::MOVED_PERMANENTLY, "/new")),
        vec![],
    );

    let res = serve(&app, get("/old"));
    assert_eq!(res.status(), Some(StatusCode::MOVED_PERMANENTLY));
    assert_eq!(res.headers().read()[header::LOCATION], "/new");
}

#[test]
fn test_head_falls_back_to_method_not_allowed() {
    let app = App::new();
    app.get("/only-get", handler_fn(|_| Ok(())), vec![]);

    let res = serve(&app, NativeRequest::new(Method::HEAD, Uri::from_static("/only-get")));
    assert_eq!(res.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
}
