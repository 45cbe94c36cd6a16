use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::bank_accounts::{BankAccount, NewBankAccount};
use crate::models::banks::{Bank, NewBank};
use crate::models::pix_keys::{PixKey, PixKeyKind, PixKeyStatus};
use crate::models::transactions::{Transaction, TransactionStatus};

pub mod bank_accounts;
pub mod banks;
pub mod memory;
pub mod pix_keys;
pub mod transactions;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate: {0}")]
    Duplicate(String),
    #[error("Stale state: {0}")]
    StaleState(String),
    #[error("Insufficient balance in account {0}")]
    InsufficientBalance(String),
    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Duplicate(
                db.constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db.message().to_string()),
            ),
            e => RepositoryError::Database(e.to_string()),
        }
    }
}

#[async_trait]
pub trait BankRepository: Send + Sync + 'static {
    /// Fails with `Duplicate` when the bank code is taken.
    async fn insert_bank(&self, bank: &NewBank) -> Result<Bank, RepositoryError>;

    async fn get_bank(&self, id: &str) -> Result<Option<Bank>, RepositoryError>;

    async fn list_banks(&self) -> Result<Vec<Bank>, RepositoryError>;
}

#[async_trait]
pub trait BankAccountRepository: Send + Sync + 'static {
    async fn insert_bank_account(
        &self,
        account: &NewBankAccount,
    ) -> Result<BankAccount, RepositoryError>;

    async fn get_bank_account(&self, id: &str) -> Result<Option<BankAccount>, RepositoryError>;

    async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, RepositoryError>;
}

#[async_trait]
pub trait PixKeyRepository: Send + Sync + 'static {
    /// Fails with `Duplicate` when another key already has the same kind and value.
    async fn insert_pix_key(&self, pix_key: &PixKey) -> Result<PixKey, RepositoryError>;

    async fn get_pix_keys_by_account(
        &self,
        bank_account_id: &str,
    ) -> Result<Vec<PixKey>, RepositoryError>;

    async fn get_pix_key(&self, id: &str) -> Result<Option<PixKey>, RepositoryError>;

    async fn find_pix_key(
        &self,
        kind: PixKeyKind,
        key: &str,
    ) -> Result<Option<PixKey>, RepositoryError>;

    /// Persists the status of `pix_key` provided the stored row is still in
    /// `previous`.
    async fn update_pix_key_status(
        &self,
        pix_key: &PixKey,
        previous: PixKeyStatus,
    ) -> Result<PixKey, RepositoryError>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync + 'static {
    async fn insert_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, RepositoryError>;

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, RepositoryError>;

    /// Persists the status and cancel description of `transaction` provided the
    /// stored row is still in `previous`.
    async fn update_transaction_status(
        &self,
        transaction: &Transaction,
        previous: TransactionStatus,
    ) -> Result<Transaction, RepositoryError>;

    /// Moves the amount from the source account to the account owning the
    /// destination key and stores the completed transaction, all or nothing.
    /// Fails with `InsufficientBalance` or `BalanceOverflow` before any
    /// balance changes.
    async fn complete_transaction(
        &self,
        transaction: &Transaction,
        previous: TransactionStatus,
    ) -> Result<Transaction, RepositoryError>;
}

#[async_trait]
pub trait SchemaCatalog: Send + Sync + 'static {
    async fn has_table(&self, table: &str) -> Result<bool, RepositoryError>;
}

pub struct PgSchemaCatalog {
    conn: PgPool,
}

impl PgSchemaCatalog {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SchemaCatalog for PgSchemaCatalog {
    async fn has_table(&self, table: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )"#,
        )
        .bind(table)
        .fetch_one(&self.conn)
        .await?;

        Ok(exists)
    }
}

/// Shared data-access layer handed to every module.
#[derive(Clone)]
pub struct Repositories {
    pub banks: Arc<dyn BankRepository>,
    pub bank_accounts: Arc<dyn BankAccountRepository>,
    pub pix_keys: Arc<dyn PixKeyRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub catalog: Arc<dyn SchemaCatalog>,
}

impl Repositories {
    pub fn postgres(conn: PgPool) -> Self {
        Self {
            banks: Arc::new(banks::PgBankRepository::new(conn.clone())),
            bank_accounts: Arc::new(bank_accounts::PgBankAccountRepository::new(conn.clone())),
            pix_keys: Arc::new(pix_keys::PgPixKeyRepository::new(conn.clone())),
            transactions: Arc::new(transactions::PgTransactionRepository::new(conn.clone())),
            catalog: Arc::new(PgSchemaCatalog::new(conn)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(memory::InMemoryStore::new());

        Self {
            banks: store.clone(),
            bank_accounts: store.clone(),
            pix_keys: store.clone(),
            transactions: store.clone(),
            catalog: store,
        }
    }
}
