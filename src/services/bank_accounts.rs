use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::bank_accounts::{BankAccount, NewBankAccount};
use crate::models::banks::{Bank, NewBank};
use crate::repositories::{BankAccountRepository, BankRepository, RepositoryError};

pub enum BankAccountRequest {
    CreateBank {
        bank: NewBank,
        response: oneshot::Sender<Result<Bank, ServiceError>>,
    },
    GetBank {
        id: String,
        response: oneshot::Sender<Result<Bank, ServiceError>>,
    },
    ListBanks {
        response: oneshot::Sender<Result<Vec<Bank>, ServiceError>>,
    },
    CreateBankAccount {
        account: NewBankAccount,
        response: oneshot::Sender<Result<BankAccount, ServiceError>>,
    },
    GetBankAccount {
        id: String,
        response: oneshot::Sender<Result<BankAccount, ServiceError>>,
    },
    ListBankAccounts {
        response: oneshot::Sender<Result<Vec<BankAccount>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct BankAccountRequestHandler {
    repository: Arc<dyn BankAccountRepository>,
    banks: Arc<dyn BankRepository>,
}

impl BankAccountRequestHandler {
    pub fn new(
        repository: Arc<dyn BankAccountRepository>,
        banks: Arc<dyn BankRepository>,
    ) -> Self {
        BankAccountRequestHandler { repository, banks }
    }

    async fn create_bank(&self, bank: NewBank) -> Result<Bank, ServiceError> {
        bank.validate()?;

        let created = self.banks.insert_bank(&bank).await.map_err(|e| match e {
            RepositoryError::Duplicate(_) => {
                ServiceError::Conflict(format!("Bank code {} already exists.", bank.code))
            }
            e => e.into(),
        })?;

        log::info!("Created bank {} ({}).", created.id, created.code);
        Ok(created)
    }

    async fn get_bank(&self, id: &str) -> Result<Bank, ServiceError> {
        self.banks
            .get_bank(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Bank {}.", id)))
    }

    async fn create_bank_account(
        &self,
        account: NewBankAccount,
    ) -> Result<BankAccount, ServiceError> {
        account.validate()?;
        self.get_bank(&account.bank_id).await?;

        let bank_account = self
            .repository
            .insert_bank_account(&account)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => ServiceError::Conflict(
                    format!("Account number {} already exists.", account.account_number),
                ),
                e => e.into(),
            })?;

        log::info!(
            "Created bank account {} ({}) at bank {}.",
            bank_account.id,
            bank_account.account_number,
            bank_account.bank_id
        );
        Ok(bank_account)
    }

    async fn get_bank_account(&self, id: &str) -> Result<BankAccount, ServiceError> {
        self.repository
            .get_bank_account(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Bank account {}.", id)))
    }
}

#[async_trait]
impl RequestHandler<BankAccountRequest> for BankAccountRequestHandler {
    async fn handle_request(&self, request: BankAccountRequest) {
        match request {
            BankAccountRequest::CreateBank { bank, response } => {
                let result = self.create_bank(bank).await;
                let _ = response.send(result);
            }
            BankAccountRequest::GetBank { id, response } => {
                let result = self.get_bank(&id).await;
                let _ = response.send(result);
            }
            BankAccountRequest::ListBanks { response } => {
                let result = self.banks.list_banks().await.map_err(ServiceError::from);
                let _ = response.send(result);
            }
            BankAccountRequest::CreateBankAccount { account, response } => {
                let result = self.create_bank_account(account).await;
                let _ = response.send(result);
            }
            BankAccountRequest::GetBankAccount { id, response } => {
                let result = self.get_bank_account(&id).await;
                let _ = response.send(result);
            }
            BankAccountRequest::ListBankAccounts { response } => {
                let result = self
                    .repository
                    .list_bank_accounts()
                    .await
                    .map_err(ServiceError::from);
                let _ = response.send(result);
            }
        }
    }
}

pub struct BankAccountService;

impl BankAccountService {
    pub fn new() -> Self {
        BankAccountService {}
    }
}

#[async_trait]
impl Service<BankAccountRequest, BankAccountRequestHandler> for BankAccountService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::InMemoryStore;

    async fn handler_with_bank() -> (BankAccountRequestHandler, Bank) {
        let store = Arc::new(InMemoryStore::new());
        let handler = BankAccountRequestHandler::new(store.clone(), store);
        let bank = handler
            .create_bank(NewBank {
                code: "001".to_string(),
                name: "test bank".to_string(),
            })
            .await
            .unwrap();

        (handler, bank)
    }

    fn new_account(bank: &Bank, account_number: &str) -> NewBankAccount {
        NewBankAccount {
            bank_id: bank.id.clone(),
            account_number: account_number.to_string(),
            owner_name: "Lucas".to_string(),
            balance_in_cents: 1_000,
        }
    }

    #[tokio::test]
    async fn creates_and_fetches_account() {
        let (handler, bank) = handler_with_bank().await;

        let created = handler
            .create_bank_account(new_account(&bank, "abcnumber"))
            .await
            .unwrap();
        let fetched = handler.get_bank_account(&created.id).await.unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.bank_id, bank.id);
        assert_eq!(fetched.balance_in_cents, 1_000);
    }

    #[tokio::test]
    async fn duplicate_bank_code_conflicts() {
        let (handler, bank) = handler_with_bank().await;

        let result = handler
            .create_bank(NewBank {
                code: bank.code.clone(),
                name: "another bank".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        assert_eq!(handler.get_bank(&bank.id).await.unwrap().name, "test bank");
    }

    #[tokio::test]
    async fn account_at_unknown_bank_is_not_found() {
        let (handler, _) = handler_with_bank().await;

        let result = handler
            .create_bank_account(NewBankAccount {
                bank_id: "missing".to_string(),
                account_number: "1111-11".to_string(),
                owner_name: "Lucas".to_string(),
                balance_in_cents: 0,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_account_number_conflicts() {
        let (handler, bank) = handler_with_bank().await;
        handler
            .create_bank_account(new_account(&bank, "1111-11"))
            .await
            .unwrap();

        let result = handler.create_bank_account(new_account(&bank, "1111-11")).await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (handler, _) = handler_with_bank().await;

        let result = handler.get_bank_account("missing").await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
