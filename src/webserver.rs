//! The optional HTTP trigger server: `/events/:name/emit` fires a web-event
//! binding, `/metrics` renders the Prometheus registry. Grounded on
//! `axum-resilient-kv-store`'s bound-`TcpListener` + `Router::with_state`
//! shape; basic auth is a small `from_fn_with_state` layer rather than a
//! pulled-in crate, since the contract is just "compare to one fixed pair".

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use jobwarden_dispatch::Attribute;
use jobwarden_runtime::RuntimeContext;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct WebServerState {
    pub ctx: RuntimeContext,
    pub metrics_handle: Option<PrometheusHandle>,
}

#[derive(Clone)]
struct BasicAuth {
    username: String,
    password: String,
}

/// Binds `addr` and serves until `cancellation` fires. `auth`, when set,
/// gates every route behind HTTP basic auth.
pub async fn serve(
    addr: SocketAddr,
    state: WebServerState,
    auth: Option<(String, String)>,
    cancellation: CancellationToken,
) -> std::io::Result<()> {
    let mut app = Router::new()
        .route("/events/:name/emit", any(emit_event))
        .route("/metrics", get(metrics))
        .with_state(state);

    if let Some((username, password)) = auth {
        let auth_state = Arc::new(BasicAuth { username, password });
        app = app.layer(middleware::from_fn_with_state(auth_state, require_basic_auth));
    }

    let listener = TcpListener::bind(addr).await?;
    #[cfg(feature = "tracing")]
    tracing::info!(%addr, "http trigger server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { cancellation.cancelled().await })
        .await
}

async fn require_basic_auth(
    State(auth): State<Arc<BasicAuth>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| credentials_match(value, &auth));

    if authorized {
        next.run(request).await
    } else {
        let mut response = StatusCode::UNAUTHORIZED.into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, "Basic realm=\"jobwarden\"".parse().unwrap());
        response
    }
}

fn credentials_match(header_value: &str, auth: &BasicAuth) -> bool {
    let Some(encoded) = header_value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = BASE64.decode(encoded) else {
        return false;
    };
    let Ok(text) = String::from_utf8(decoded) else {
        return false;
    };
    match text.split_once(':') {
        Some((user, pass)) => user == auth.username && pass == auth.password,
        None => false,
    }
}

/// `POST|GET|ANY /events/:name/emit` — the query string becomes the
/// event's attribute table, verbatim, matching the webserver endpoint
/// contract this catalog format's trigger surface descends from.
async fn emit_event(
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<WebServerState>,
) -> impl IntoResponse {
    let attributes: HashMap<String, Attribute> =
        params.into_iter().map(|(k, v)| (k, Attribute::Str(v))).collect();

    let emitted = state.ctx.web_events.trigger(&name, attributes);
    if emitted == 0 {
        (StatusCode::NOT_FOUND, format!("no listener registered for event {name:?}")).into_response()
    } else {
        (StatusCode::OK, format!("{{\"emitted\":{emitted}}}")).into_response()
    }
}

async fn metrics(State(state): State<WebServerState>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwarden_core::MetricRegistry;
    use jobwarden_dispatch::Dispatcher;
    use jobwarden_sources::WebEventRegistry;

    fn state() -> WebServerState {
        WebServerState {
            ctx: RuntimeContext::new(MetricRegistry::new(), Arc::new(WebEventRegistry::new())),
            metrics_handle: None,
        }
    }

    async fn spawn_server(state: WebServerState, auth: Option<(String, String)>) -> (SocketAddr, CancellationToken) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let cancellation = CancellationToken::new();
        let token = cancellation.clone();
        tokio::spawn(async move {
            let _ = serve(addr, state, auth, token).await;
        });
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        (addr, cancellation)
    }

    #[tokio::test]
    async fn emitting_an_unbound_event_returns_404() {
        let (addr, cancellation) = spawn_server(state(), None).await;
        let response = reqwest::get(format!("http://{addr}/events/nothing/emit")).await.unwrap();
        assert_eq!(response.status(), 404);
        cancellation.cancel();
    }

    #[tokio::test]
    async fn emitting_a_bound_event_notifies_its_listener() {
        let state = state();
        let dispatcher = Dispatcher::new("job");
        let seen = Arc::new(parking_lot::Mutex::new(false));
        let s = Arc::clone(&seen);
        dispatcher.add_listener(move |_| *s.lock() = true);
        state.ctx.web_events.register("deploy", Arc::new(dispatcher));

        let (addr, cancellation) = spawn_server(state, None).await;
        let response = reqwest::get(format!("http://{addr}/events/deploy/emit?branch=main")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert!(*seen.lock());
        cancellation.cancel();
    }

    #[tokio::test]
    async fn requests_without_credentials_are_rejected_when_auth_is_configured() {
        let (addr, cancellation) =
            spawn_server(state(), Some(("admin".to_string(), "secret".to_string()))).await;

        let response = reqwest::get(format!("http://{addr}/events/x/emit")).await.unwrap();
        assert_eq!(response.status(), 401);
        cancellation.cancel();
    }

    #[tokio::test]
    async fn correct_credentials_are_accepted() {
        let (addr, cancellation) =
            spawn_server(state(), Some(("admin".to_string(), "secret".to_string()))).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{addr}/events/x/emit"))
            .basic_auth("admin", Some("secret"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404); // auth passed, no listener bound
        cancellation.cancel();
    }
}
