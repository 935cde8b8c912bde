//! HTTP layer - JSON API for the canteen client
//!
//! This module exposes the dispatcher, the read projection and authentication over axum,
//! and owns the server lifecycle (bind, serve, graceful shutdown).

/// HTTP rendering of crate errors
pub mod error;
/// Route handlers
pub mod handlers;

use crate::{
    core::{crypto::FieldCipher, dispatcher::Dispatcher, store::Store},
    errors::Result,
};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use handlers::{action_handler, login_handler, register_handler, sync_handler};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared state available to all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Applies client actions
    pub dispatcher: Dispatcher,
    /// Decrypts user fields for login and sync responses
    pub cipher: Arc<FieldCipher>,
}

impl AppState {
    /// Builds the state around one store and one cipher.
    #[must_use]
    pub fn new(store: Store, cipher: Arc<FieldCipher>) -> Self {
        Self {
            dispatcher: Dispatcher::new(store, Arc::clone(&cipher)),
            cipher,
        }
    }
}

/// All routes, with CORS open to any origin.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/action", post(action_handler))
        .route("/api/sync", get(sync_handler))
        .route("/api/login", post(login_handler))
        .route("/api/register", post(register_handler))
        .layer(cors)
        .with_state(state)
}

/// Binds `address` and serves until Ctrl+C or SIGTERM.
pub async fn serve(address: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", address, e))?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn test_app() -> (Router, i64) {
        let (store, dish) = setup_with_student_and_dish(1000.0, 150.0, 5).await.unwrap();
        let app = router(AppState::new(store, Arc::new(test_cipher())));
        (app, dish.id)
    }

    #[tokio::test]
    async fn test_action_buy_then_sync() {
        let (app, dish_id) = test_app().await;

        let (status, body) = call(
            app.clone(),
            Method::POST,
            "/api/action",
            Some(json!({"type": "buy", "user": "a", "menuId": dish_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, snap) = call(app, Method::GET, "/api/sync", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snap["menu"][0]["portions"], 4);
        assert_eq!(snap["users"][0]["balance"], 850.0);
        assert_eq!(snap["orders"][0]["status"], "Paid");
    }

    #[tokio::test]
    async fn test_action_errors_are_json() {
        let (app, dish_id) = test_app().await;

        let (status, body) = call(
            app.clone(),
            Method::POST,
            "/api/action",
            Some(json!({"type": "teleport"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "UnknownAction");

        let (status, body) = call(
            app.clone(),
            Method::POST,
            "/api/action",
            Some(json!({"type": "refill", "user": "a", "amount": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidAmount");

        // An unknown buyer is rejected like an unaffordable purchase
        let (status, body) = call(
            app,
            Method::POST,
            "/api/action",
            Some(json!({"type": "buy", "user": "ghost", "menuId": dish_id})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InsufficientFundsOrStock");
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (app, _) = test_app().await;
        let registration = json!({
            "username": "cook",
            "password": "pw",
            "fullName": "Chef Cook",
            "role": "chef",
            "school": "School 1",
            "email": "cook@example.com"
        });

        let (status, _) = call(app.clone(), Method::POST, "/api/register", Some(registration.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app.clone(), Method::POST, "/api/register", Some(registration)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "DuplicateUsername");

        let login = json!({"username": "cook", "password": "pw"});
        let (status, body) = call(app.clone(), Method::POST, "/api/login", Some(login)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "ChefNotApproved");

        let (status, _) = call(
            app.clone(),
            Method::POST,
            "/api/action",
            Some(json!({"type": "approve_chef", "target": "cook"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let login = json!({"username": "cook", "password": "pw"});
        let (status, body) = call(app.clone(), Method::POST, "/api/login", Some(login)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "cook@example.com");
        assert!(body.get("passwordHash").is_none());

        let bad = json!({"username": "cook", "password": "nope"});
        let (status, _) = call(app, Method::POST, "/api/login", Some(bad)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let (app, _) = test_app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/action")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "ValidationError");
    }
}
