use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use passgate_auth::relying_party::{RelyingPartyClient, RelyingPartyConfig, relying_party_routes};
use passgate_server::{AppConfig, ClientEntry, UserEntry, build_app};
use serde_json::Value;
use tokio::task::JoinHandle;
use tower::ServiceExt;

const APP1_CB: &str = "http://localhost:3001/callback";

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.signing.secret = Some("endpoint-test-secret".into());
    cfg.clients = vec![ClientEntry {
        client_id: "app1".into(),
        name: None,
        redirect_uri: APP1_CB.into(),
        client_secret: Some("app1_secret".into()),
        client_secret_hash: None,
        active: true,
    }];
    cfg.users = vec![UserEntry {
        username: "john.doe".into(),
        full_name: "John Doe".into(),
        email: "john.doe@example.com".into(),
        password: Some("password123".into()),
        password_hash: None,
        active: true,
    }];
    cfg
}

async fn start_server(app: Router) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn set_cookie(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .find(|c| c.starts_with(&format!("{name}=")))
}

fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

/// Path and query of an absolute URL.
fn path_and_query(url: &str) -> String {
    let parsed = url::Url::parse(url).unwrap();
    parsed[url::Position::BeforePath..].to_string()
}

#[tokio::test]
async fn health_endpoints() {
    let app = build_app(&test_config()).await.expect("build app");

    let resp = send(&app, Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "ok");

    let resp = send(&app, Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "ready");
}

#[tokio::test]
async fn build_app_rejects_missing_signing_secret() {
    let mut cfg = test_config();
    cfg.auth.signing.secret = None;
    assert!(build_app(&cfg).await.is_err());
}

#[tokio::test]
async fn relying_party_login_end_to_end() {
    let provider = build_app(&test_config()).await.expect("build app");
    let (base, shutdown_tx, handle) = start_server(provider.clone()).await;

    let rp = Arc::new(
        RelyingPartyClient::new(RelyingPartyConfig::new(
            base.clone(),
            "app1",
            "app1_secret",
            APP1_CB,
        ))
        .unwrap(),
    );
    let relying_app = relying_party_routes(rp);

    // Browser logs in at the provider.
    let resp = send(
        &provider,
        Request::post("/api/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=john.doe&password=password123"))
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let sso_cookie = cookie_pair(&set_cookie(&resp, "sso_session_token").expect("sso cookie"));
    assert_eq!(json_body(resp).await["message"], "Login successful");

    // Relying app starts the flow.
    let resp = send(&relying_app, Request::get("/login").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let state_cookie = cookie_pair(&set_cookie(&resp, "passgate_state").expect("state cookie"));
    let authorize_url = location(&resp);
    assert!(authorize_url.starts_with(&format!("{base}/authorize?")));

    // Provider issues a code for the logged-in browser.
    let resp = send(
        &provider,
        Request::get(path_and_query(&authorize_url))
            .header(header::COOKIE, &sso_cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let callback_url = location(&resp);
    assert!(callback_url.starts_with(APP1_CB));

    // Relying app redeems the code over HTTP and stores the token.
    let resp = send(
        &relying_app,
        Request::get(path_and_query(&callback_url))
            .header(header::COOKIE, &state_cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let session = set_cookie(&resp, "client_session_token").expect("client session cookie");
    assert!(session.contains("Max-Age=900"));
    let access_token = cookie_pair(&session)
        .trim_start_matches("client_session_token=")
        .to_string();

    // The token identifies john.doe at the provider.
    let resp = send(
        &provider,
        Request::get("/api/me")
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await;
    assert_eq!(me["sub"], "john.doe");
    assert_eq!(me["full_name"], "John Doe");

    // Replaying the callback fails: the code is spent.
    let resp = send(
        &relying_app,
        Request::get(path_and_query(&callback_url))
            .header(header::COOKIE, &state_cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(location(&resp), "/?error=TokenExchangeFailed");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
