use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::AppState;
use crate::models::transactions::{CancelTransaction, NewTransaction, Transaction};
use crate::modules::TransactionsModule;
use crate::services::{send_request, transactions::TransactionServiceRequest, ServiceError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bank-accounts/{id}/transactions",
            post(register_transaction),
        )
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}/confirm", post(confirm_transaction))
        .route("/transactions/{id}/complete", post(complete_transaction))
        .route("/transactions/{id}/cancel", post(cancel_transaction))
}

async fn register_transaction(
    State(state): State<AppState>,
    Path(bank_account_from_id): Path<String>,
    Json(transaction): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), ServiceError> {
    let transaction = send_request(
        &state.transaction_channel,
        TransactionsModule::PROVIDER,
        |response| {
            TransactionServiceRequest::RegisterTransaction {
                bank_account_from_id,
                transaction,
                response,
            }
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, ServiceError> {
    let transaction = send_request(
        &state.transaction_channel,
        TransactionsModule::PROVIDER,
        |response| {
            TransactionServiceRequest::GetTransaction {
                transaction_id,
                response,
            }
        },
    )
    .await?;

    Ok(Json(transaction))
}

async fn confirm_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, ServiceError> {
    let transaction = send_request(
        &state.transaction_channel,
        TransactionsModule::PROVIDER,
        |response| {
            TransactionServiceRequest::ConfirmTransaction {
                transaction_id,
                response,
            }
        },
    )
    .await?;

    Ok(Json(transaction))
}

async fn complete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, ServiceError> {
    let transaction = send_request(
        &state.transaction_channel,
        TransactionsModule::PROVIDER,
        |response| {
            TransactionServiceRequest::CompleteTransaction {
                transaction_id,
                response,
            }
        },
    )
    .await?;

    Ok(Json(transaction))
}

async fn cancel_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    Json(cancel): Json<CancelTransaction>,
) -> Result<Json<Transaction>, ServiceError> {
    let transaction = send_request(
        &state.transaction_channel,
        TransactionsModule::PROVIDER,
        |response| {
            TransactionServiceRequest::CancelTransaction {
                transaction_id,
                description: cancel.description,
                response,
            }
        },
    )
    .await?;

    Ok(Json(transaction))
}
