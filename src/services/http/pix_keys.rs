//! PixKeysController: HTTP surface of the PIX keys module.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::models::pix_keys::{NewPixKey, PixKey};
use crate::modules::PixKeysModule;
use crate::services::{pix_keys::PixKeyRequest, send_request, ServiceError};

#[derive(Deserialize)]
pub struct PixKeyQuery {
    kind: String,
    key: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bank-accounts/{id}/pix-keys",
            get(list_pix_keys).post(create_pix_key),
        )
        .route("/pix-keys/exists", get(pix_key_exists))
        .route("/pix-keys/{id}", delete(deactivate_pix_key))
        .route("/pix-keys/{kind}/{key}", get(find_pix_key))
}

async fn create_pix_key(
    State(state): State<AppState>,
    Path(bank_account_id): Path<String>,
    Json(req): Json<NewPixKey>,
) -> Result<(StatusCode, Json<PixKey>), ServiceError> {
    let pix_key = send_request(
        &state.pix_key_channel,
        PixKeysModule::PROVIDER,
        |response| {
            PixKeyRequest::CreatePixKey {
                bank_account_id,
                kind: req.kind,
                key: req.key,
                response,
            }
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(pix_key)))
}

async fn list_pix_keys(
    State(state): State<AppState>,
    Path(bank_account_id): Path<String>,
) -> Result<Json<Vec<PixKey>>, ServiceError> {
    let pix_keys = send_request(
        &state.pix_key_channel,
        PixKeysModule::PROVIDER,
        |response| {
            PixKeyRequest::ListPixKeys {
                bank_account_id,
                response,
            }
        },
    )
    .await?;

    Ok(Json(pix_keys))
}

async fn pix_key_exists(
    State(state): State<AppState>,
    Query(query): Query<PixKeyQuery>,
) -> Result<Json<Value>, ServiceError> {
    let exists = send_request(
        &state.pix_key_channel,
        PixKeysModule::PROVIDER,
        |response| {
            PixKeyRequest::PixKeyExists {
                kind: query.kind,
                key: query.key,
                response,
            }
        },
    )
    .await?;

    Ok(Json(json!({ "exists": exists })))
}

async fn find_pix_key(
    State(state): State<AppState>,
    Path((kind, key)): Path<(String, String)>,
) -> Result<Json<PixKey>, ServiceError> {
    let pix_key = send_request(
        &state.pix_key_channel,
        PixKeysModule::PROVIDER,
        |response| {
            PixKeyRequest::FindPixKey {
                kind,
                key,
                response,
            }
        },
    )
    .await?;

    Ok(Json(pix_key))
}

/// Keys are never removed; deleting one only marks it inactive.
async fn deactivate_pix_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PixKey>, ServiceError> {
    let pix_key = send_request(
        &state.pix_key_channel,
        PixKeysModule::PROVIDER,
        |response| PixKeyRequest::DeactivatePixKey { id, response },
    )
    .await?;

    Ok(Json(pix_key))
}
