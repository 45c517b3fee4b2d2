use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, coins, config::AppConfig, prizes, state::AppState, tasks, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(tasks::router())
        .merge(coins::router())
        .merge(prizes::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod app_tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn earn_and_redeem_over_http() {
        let app = build_app(AppState::fake());

        let (status, admin) = call(
            &app,
            "POST",
            "/users",
            Some(json!({"name": "Ana", "email": "ana@example.com", "password": "secret123", "role": "ADMIN"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, user) = call(
            &app,
            "POST",
            "/users",
            Some(json!({"name": "Luis", "email": "luis@example.com", "password": "secret123"})),
        )
        .await;
        let (status, task) = call(
            &app,
            "POST",
            "/tasks",
            Some(json!({"name": "Cleanup", "description": "clean the desk", "reward": 10, "visibility": "AMBOS"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, coin) = call(
            &app,
            "POST",
            "/coins",
            Some(json!({"userId": user["id"], "taskId": task["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(coin["status"], "PENDING");
        assert_eq!(coin["amount"], 10);

        let uri = format!("/coins/{}/approve", coin["id"].as_str().unwrap());
        let (status, _) = call(&app, "PATCH", &uri, Some(json!({"adminId": user["id"]}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, "PATCH", &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, approved) = call(&app, "PATCH", &uri, Some(json!({"adminId": admin["id"]}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "APPROVED");
        let (status, _) = call(&app, "PATCH", &uri, Some(json!({"adminId": admin["id"]}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, prize) = call(
            &app,
            "POST",
            "/prizes",
            Some(json!({"name": "Mug", "description": "a mug", "cost": 10})),
        )
        .await;
        let (status, redemption) = call(
            &app,
            "POST",
            "/prize-redemptions",
            Some(json!({"userId": user["id"], "prizeId": prize["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(redemption["status"], "PENDING");

        let (status, err) = call(
            &app,
            "POST",
            "/prize-redemptions",
            Some(json!({"userId": user["id"], "prizeId": prize["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].is_string());

        let uri = format!("/users/{}", user["id"].as_str().unwrap());
        let (status, fetched) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["coins"], 0);
        assert!(fetched.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn malformed_ids_are_bad_requests() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, "GET", "/users/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        let (status, _) = call(&app, "GET", &format!("/prizes/{}", uuid::Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
