use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::pix_keys::PixKeyRequest;
use super::{send_request, RequestHandler, Service, ServiceError};
use crate::models::transactions::{NewTransaction, Transaction};
use crate::modules::PixKeysModule;
use crate::repositories::{BankAccountRepository, RepositoryError, TransactionRepository};

const INSUFFICIENT_BALANCE: &str = "insufficient balance";

pub enum TransactionServiceRequest {
    RegisterTransaction {
        bank_account_from_id: String,
        transaction: NewTransaction,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    GetTransaction {
        transaction_id: String,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    ConfirmTransaction {
        transaction_id: String,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    CompleteTransaction {
        transaction_id: String,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    CancelTransaction {
        transaction_id: String,
        description: String,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct TransactionRequestHandler {
    repository: Arc<dyn TransactionRepository>,
    bank_accounts: Arc<dyn BankAccountRepository>,
    pix_key_channel: mpsc::Sender<PixKeyRequest>,
}

impl TransactionRequestHandler {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        bank_accounts: Arc<dyn BankAccountRepository>,
        pix_key_channel: mpsc::Sender<PixKeyRequest>,
    ) -> Self {
        TransactionRequestHandler {
            repository,
            bank_accounts,
            pix_key_channel,
        }
    }

    async fn register_transaction(
        &self,
        bank_account_from_id: &str,
        request: NewTransaction,
    ) -> Result<Transaction, ServiceError> {
        if self
            .bank_accounts
            .get_bank_account(bank_account_from_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Bank account {}.",
                bank_account_from_id
            )));
        }

        let pix_key_to = send_request(
            &self.pix_key_channel,
            PixKeysModule::PROVIDER,
            |response| PixKeyRequest::FindPixKey {
                kind: request.pix_key_kind.clone(),
                key: request.pix_key.clone(),
                response,
            },
        )
        .await?;

        let transaction = Transaction::new(
            bank_account_from_id,
            request.amount_in_cents,
            &pix_key_to,
            &request.description,
        )?;
        let transaction = self.repository.insert_transaction(&transaction).await?;

        log::info!(
            "Registered transaction {} of {} cents from {} to pix key {}.",
            transaction.id,
            transaction.amount_in_cents,
            transaction.bank_account_from_id,
            transaction.pix_key_id_to
        );
        Ok(transaction)
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction, ServiceError> {
        self.repository
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {}.", transaction_id)))
    }

    async fn confirm_transaction(&self, transaction_id: &str) -> Result<Transaction, ServiceError> {
        let mut transaction = self.get_transaction(transaction_id).await?;
        let previous = transaction.status;
        transaction.confirm()?;

        Ok(self
            .repository
            .update_transaction_status(&transaction, previous)
            .await?)
    }

    async fn cancel_transaction(
        &self,
        transaction_id: &str,
        description: &str,
    ) -> Result<Transaction, ServiceError> {
        let mut transaction = self.get_transaction(transaction_id).await?;
        let previous = transaction.status;
        transaction.cancel(description)?;

        let transaction = self
            .repository
            .update_transaction_status(&transaction, previous)
            .await?;

        log::info!(
            "Cancelled transaction {}: {}.",
            transaction.id,
            description
        );
        Ok(transaction)
    }

    /// Transfers the funds. A source account without enough balance moves
    /// the transaction to `error` and the caller gets a validation error.
    async fn complete_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Transaction, ServiceError> {
        let mut transaction = self.get_transaction(transaction_id).await?;
        let previous = transaction.status;
        transaction.complete()?;

        match self
            .repository
            .complete_transaction(&transaction, previous)
            .await
        {
            Ok(transaction) => {
                log::info!("Completed transaction {}.", transaction.id);
                Ok(transaction)
            }
            Err(e @ RepositoryError::InsufficientBalance(_)) => {
                log::warn!("Transaction {} failed: {}", transaction_id, e);
                self.cancel_transaction(transaction_id, INSUFFICIENT_BALANCE)
                    .await?;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RequestHandler<TransactionServiceRequest> for TransactionRequestHandler {
    async fn handle_request(&self, request: TransactionServiceRequest) {
        match request {
            TransactionServiceRequest::RegisterTransaction {
                bank_account_from_id,
                transaction,
                response,
            } => {
                let result = self
                    .register_transaction(&bank_account_from_id, transaction)
                    .await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::GetTransaction {
                transaction_id,
                response,
            } => {
                let result = self.get_transaction(&transaction_id).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::ConfirmTransaction {
                transaction_id,
                response,
            } => {
                let result = self.confirm_transaction(&transaction_id).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::CompleteTransaction {
                transaction_id,
                response,
            } => {
                let result = self.complete_transaction(&transaction_id).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::CancelTransaction {
                transaction_id,
                description,
                response,
            } => {
                let result = self.cancel_transaction(&transaction_id, &description).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct TransactionService;

impl TransactionService {
    pub fn new() -> Self {
        TransactionService {}
    }
}

#[async_trait]
impl Service<TransactionServiceRequest, TransactionRequestHandler> for TransactionService {}
