//! End-to-end tests: a real listener on an ephemeral port, driven over HTTP.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use plinth::prelude::*;
use plinth::{CancellationToken, api, async_trait};

/// Rendering stub that echoes the request path.
const ECHO_SCRIPT: &str = r#"fn render(ctx) { "<div>" + ctx.path + "</div>" }"#;

/// Test-only route that panics mid-request.
struct Boom;

#[async_trait]
impl Handler for Boom {
    async fn call(&self, _c: &mut Ctx) -> HandlerOutput {
        panic!("kaboom");
    }
}

async fn spawn_app(doc: &str, script: &str) -> SocketAddr {
    let config = Config::from_str(doc).expect("test config");
    let renderer = RenderPool::new(&config.engine, script, config.debug).expect("test engine");

    let api_prefix = config.api.prefix.clone();
    let router = Router::new()
        .middleware(LoggingMiddleware::new())
        .middleware(CatchPanicMiddleware::new())
        .get("/favicon.ico", Favicon)
        .get("/boom", Boom)
        .push(api::routes(&api_prefix))
        .fallback(Dispatch);

    let app = App::new(AppState { config, renderer }).router(router);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    tokio::spawn(app.serve(listener, shutdown));
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn bundled_assets_are_served_byte_identical() {
    let addr = spawn_app("", ECHO_SCRIPT).await;
    let res = client()
        .get(format!("http://{addr}/static/css/app.css"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/css"), "{content_type}");
    assert_eq!(
        res.bytes().await.unwrap().as_ref(),
        include_bytes!("../assets/static/css/app.css")
    );
}

#[tokio::test]
async fn app_routes_fall_back_to_rendering() {
    let addr = spawn_app("", ECHO_SCRIPT).await;
    let res = client()
        .get(format!("http://{addr}/about"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "{content_type}");
    assert_eq!(res.text().await.unwrap(), "<div>/about</div>");
}

#[tokio::test]
async fn asset_hits_never_invoke_the_engine() {
    // Any render call fails loudly; asset requests must not trip it.
    let addr = spawn_app("", r#"fn render(ctx) { throw "engine invoked"; }"#).await;

    for path in ["/static/css/app.css", "/static/js/app.js"] {
        let res = client()
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200, "asset {path} should bypass rendering");
    }
}

#[tokio::test]
async fn api_routes_bypass_the_dispatcher() {
    let addr = spawn_app("", r#"fn render(ctx) { throw "engine invoked"; }"#).await;
    let res = client()
        .get(format!("http://{addr}/api/ping"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["result"], "pong");
}

#[tokio::test]
async fn favicon_redirects_into_the_bundle() {
    let addr = spawn_app("", ECHO_SCRIPT).await;
    let res = client()
        .get(format!("http://{addr}/favicon.ico"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 301);
    assert_eq!(
        res.headers()["location"].to_str().unwrap(),
        "/static/images/favicon.ico"
    );
}

#[tokio::test]
async fn wrong_method_on_a_registered_route_is_405() {
    let addr = spawn_app("", ECHO_SCRIPT).await;
    let res = client()
        .post(format!("http://{addr}/favicon.ico"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 405);
}

#[tokio::test]
async fn head_requests_have_headers_but_no_body() {
    let addr = spawn_app("", ECHO_SCRIPT).await;
    let res = client()
        .head(format!("http://{addr}/about"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_requests_get_distinct_ids() {
    let addr = spawn_app("", ECHO_SCRIPT).await;
    let http = Arc::new(client());

    let mut tasks = Vec::new();
    for _ in 0..100 {
        let http = Arc::clone(&http);
        tasks.push(tokio::spawn(async move {
            let res = http
                .get(format!("http://{addr}/api/conf"))
                .send()
                .await
                .unwrap();
            let body: serde_json::Value = res.json().await.unwrap();
            body["requestId"].as_str().unwrap().to_string()
        }));
    }

    let mut seen = HashSet::new();
    for task in tasks {
        assert!(seen.insert(task.await.unwrap()), "request id collision");
    }
    assert_eq!(seen.len(), 100);
}

#[tokio::test]
async fn render_failure_is_500_and_the_server_recovers() {
    let addr = spawn_app(
        "",
        r#"
        fn render(ctx) {
            if ctx.path == "/fail" { throw "boom"; }
            "<div>ok</div>"
        }
        "#,
    )
    .await;
    let http = client();

    let res = http
        .get(format!("http://{addr}/fail"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    // opaque body outside debug mode
    let body = res.text().await.unwrap();
    assert!(!body.contains("boom"), "{body}");

    let res = http
        .get(format!("http://{addr}/next"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "<div>ok</div>");
}

#[tokio::test]
async fn debug_mode_exposes_render_error_detail() {
    let addr = spawn_app(
        "debug = true",
        r#"fn render(ctx) { throw "boom"; }"#,
    )
    .await;

    let res = client()
        .get(format!("http://{addr}/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert!(res.text().await.unwrap().contains("rendering failed"));
}

#[tokio::test]
async fn render_timeout_is_500_and_the_pool_recovers() {
    let addr = spawn_app(
        r#"
        [engine]
        pool_size = 2
        timeout_ms = 100
        max_operations = 10000000
        "#,
        r#"
        fn render(ctx) {
            if ctx.path == "/slow" {
                let x = 0;
                loop { x += 1; }
            }
            "<div>fast</div>"
        }
        "#,
    )
    .await;
    let http = client();

    let res = http
        .get(format!("http://{addr}/slow"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    let res = http
        .get(format!("http://{addr}/after"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "<div>fast</div>");
}

#[tokio::test]
async fn panics_are_isolated_to_the_request() {
    let addr = spawn_app("", ECHO_SCRIPT).await;
    let http = client();

    let res = http
        .get(format!("http://{addr}/boom"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    // the listener survives
    let res = http
        .get(format!("http://{addr}/api/ping"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
