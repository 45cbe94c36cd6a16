use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::AppState;
use crate::models::bank_accounts::{BankAccount, NewBankAccount};
use crate::models::banks::{Bank, NewBank};
use crate::modules::BankAccountsModule;
use crate::services::{bank_accounts::BankAccountRequest, send_request, ServiceError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/banks", get(list_banks).post(create_bank))
        .route("/banks/{id}", get(get_bank))
        .route(
            "/bank-accounts",
            get(list_bank_accounts).post(create_bank_account),
        )
        .route("/bank-accounts/{id}", get(get_bank_account))
}

async fn create_bank(
    State(state): State<AppState>,
    Json(bank): Json<NewBank>,
) -> Result<(StatusCode, Json<Bank>), ServiceError> {
    let bank = send_request(
        &state.bank_account_channel,
        BankAccountsModule::PROVIDER,
        |response| BankAccountRequest::CreateBank { bank, response },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(bank)))
}

async fn list_banks(State(state): State<AppState>) -> Result<Json<Vec<Bank>>, ServiceError> {
    let banks = send_request(
        &state.bank_account_channel,
        BankAccountsModule::PROVIDER,
        |response| BankAccountRequest::ListBanks { response },
    )
    .await?;

    Ok(Json(banks))
}

async fn get_bank(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Bank>, ServiceError> {
    let bank = send_request(
        &state.bank_account_channel,
        BankAccountsModule::PROVIDER,
        |response| BankAccountRequest::GetBank { id, response },
    )
    .await?;

    Ok(Json(bank))
}

async fn create_bank_account(
    State(state): State<AppState>,
    Json(account): Json<NewBankAccount>,
) -> Result<(StatusCode, Json<BankAccount>), ServiceError> {
    let bank_account = send_request(
        &state.bank_account_channel,
        BankAccountsModule::PROVIDER,
        |response| BankAccountRequest::CreateBankAccount { account, response },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(bank_account)))
}

async fn list_bank_accounts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankAccount>>, ServiceError> {
    let bank_accounts = send_request(
        &state.bank_account_channel,
        BankAccountsModule::PROVIDER,
        |response| BankAccountRequest::ListBankAccounts { response },
    )
    .await?;

    Ok(Json(bank_accounts))
}

async fn get_bank_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BankAccount>, ServiceError> {
    let bank_account = send_request(
        &state.bank_account_channel,
        BankAccountsModule::PROVIDER,
        |response| BankAccountRequest::GetBankAccount { id, response },
    )
    .await?;

    Ok(Json(bank_account))
}
