use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::models::ModelError;
use crate::modules::{
    BankAccountsModule, ModuleError, ModuleRegistry, PixKeysModule, TransactionsModule,
};
use crate::repositories::{Repositories, RepositoryError};

pub mod bank_accounts;
pub mod http;
pub mod pix_keys;
pub mod transactions;

const CHANNEL_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::InvalidTransition { .. } | ModelError::AlreadyInactive(_) => {
                ServiceError::Conflict(e.to_string())
            }
            e => ServiceError::Validation(e.to_string()),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(_) => ServiceError::NotFound(e.to_string()),
            RepositoryError::Duplicate(_)
            | RepositoryError::StaleState(_)
            | RepositoryError::BalanceOverflow(_) => ServiceError::Conflict(e.to_string()),
            RepositoryError::InsufficientBalance(_) => ServiceError::Validation(e.to_string()),
            RepositoryError::Database(e) => ServiceError::Database(e),
        }
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

/// Sends a request built around a fresh response channel and waits for the
/// answer. `target` names the receiving service in communication errors.
pub async fn send_request<R, T, F>(
    channel: &mpsc::Sender<R>,
    target: &str,
    build: F,
) -> Result<T, ServiceError>
where
    R: Send + 'static,
    F: FnOnce(oneshot::Sender<Result<T, ServiceError>>) -> R,
{
    let (response_tx, response_rx) = oneshot::channel();

    channel
        .send(build(response_tx))
        .await
        .map_err(|e| ServiceError::Communication(target.to_string(), e.to_string()))?;

    response_rx
        .await
        .map_err(|e| ServiceError::Communication(target.to_string(), e.to_string()))?
}

/// Running services together with the modules they back.
pub struct Application {
    pub registry: ModuleRegistry,
    pub state: http::AppState,
}

pub async fn start_services(repositories: Repositories) -> Result<Application, ModuleError> {
    let (bank_account_tx, mut bank_account_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (pix_key_tx, mut pix_key_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (transaction_tx, mut transaction_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let mut registry = ModuleRegistry::new();

    let mut bank_account_service = bank_accounts::BankAccountService::new();
    let mut pix_key_service = pix_keys::PixKeysService::new();
    let mut transaction_service = transactions::TransactionService::new();

    log::info!("Starting bank account service.");
    let bank_account_handler = bank_accounts::BankAccountRequestHandler::new(
        repositories.bank_accounts.clone(),
        repositories.banks.clone(),
    );
    tokio::spawn(async move {
        bank_account_service
            .run(bank_account_handler, &mut bank_account_rx)
            .await;
    });
    registry.provide(BankAccountsModule::PROVIDER);

    log::info!("Starting pix key service.");
    let pix_key_handler = pix_keys::PixKeyRequestHandler::new(
        repositories.pix_keys.clone(),
        repositories.bank_accounts.clone(),
    );
    tokio::spawn(async move {
        pix_key_service
            .run(pix_key_handler, &mut pix_key_rx)
            .await;
    });
    registry.provide(PixKeysModule::PROVIDER);

    log::info!("Starting transaction service.");
    let transaction_handler = transactions::TransactionRequestHandler::new(
        repositories.transactions.clone(),
        repositories.bank_accounts.clone(),
        pix_key_tx.clone(),
    );
    tokio::spawn(async move {
        transaction_service
            .run(transaction_handler, &mut transaction_rx)
            .await;
    });
    registry.provide(TransactionsModule::PROVIDER);

    let catalog = repositories.catalog.as_ref();
    registry
        .register(BankAccountsModule::definition()?, catalog)
        .await?;
    registry
        .register(PixKeysModule::definition()?, catalog)
        .await?;
    registry
        .register(TransactionsModule::definition()?, catalog)
        .await?;

    log::info!("Started services.");
    Ok(Application {
        registry,
        state: http::AppState {
            bank_account_channel: bank_account_tx,
            pix_key_channel: pix_key_tx,
            transaction_channel: transaction_tx,
        },
    })
}
