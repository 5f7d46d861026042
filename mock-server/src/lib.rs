use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Path,
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderMap, Method, StatusCode,
    },
    response::{AppendHeaders, IntoResponse},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw of the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/cookies/set", get(set_cookies))
        .route("/login", get(login))
        .route("/see-other", any(see_other))
        .route("/delay/{secs}", get(delay))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn set_cookies() -> impl IntoResponse {
    (
        AppendHeaders([
            (SET_COOKIE, "session=abc123; Path=/; HttpOnly"),
            (SET_COOKIE, "theme=dark"),
        ]),
        "cookies set",
    )
}

/// Sets a session cookie and sends the client on to `/echo`.
async fn login() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        AppendHeaders([(LOCATION, "/echo"), (SET_COOKIE, "sid=1; Path=/")]),
        "",
    )
}

async fn see_other() -> impl IntoResponse {
    (StatusCode::SEE_OTHER, AppendHeaders([(LOCATION, "/echo")]), "")
}

async fn delay(Path(secs): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_secs(secs)).await;
    "done"
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")),
        Err(_) => (StatusCode::BAD_REQUEST, format!("bad status {code}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "GET".to_string(),
            headers: BTreeMap::from([("user-agent".to_string(), "test".to_string())]),
            body: String::new(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["headers"]["user-agent"], "test");
        assert_eq!(json["body"], "");
    }

    #[test]
    fn echo_roundtrips_through_json() {
        let echo = Echo {
            method: "POST".to_string(),
            headers: BTreeMap::new(),
            body: "q=go+lang".to_string(),
        };
        let back: Echo = serde_json::from_str(&serde_json::to_string(&echo).unwrap()).unwrap();
        assert_eq!(back.method, echo.method);
        assert_eq!(back.body, echo.body);
    }
}
