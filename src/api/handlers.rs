//! Request handlers. Each one is a thin adapter over a core operation.

use super::AppState;
use crate::{
    core::{
        auth::{self, Registration},
        command::Command,
        dispatcher::Ack,
        sync::{self, Snapshot, UserView},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::validation(rejection.body_text()))
}

/// `POST /api/action`
pub async fn action_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Ack>> {
    let command = Command::from_json(body(payload)?)?;
    debug!(action = command.kind(), "action received");
    state.dispatcher.apply(command).await.map(Json)
}

/// `GET /api/sync`
pub async fn sync_handler(State(state): State<AppState>) -> Result<Json<Snapshot>> {
    sync::snapshot(state.dispatcher.store(), &state.cipher)
        .await
        .map(Json)
}

/// `POST /api/login`
pub async fn login_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserView>> {
    let LoginRequest { username, password } = body(payload)?;
    auth::verify_credentials(state.dispatcher.store(), &state.cipher, &username, &password)
        .await
        .map(Json)
}

/// `POST /api/register`
pub async fn register_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<Json<Ack>> {
    auth::register_user(state.dispatcher.store(), &state.cipher, body(payload)?).await?;
    Ok(Json(Ack::OK))
}
