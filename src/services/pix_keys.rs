use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::pix_keys::{PixKey, PixKeyKind};
use crate::repositories::{BankAccountRepository, PixKeyRepository, RepositoryError};

pub enum PixKeyRequest {
    CreatePixKey {
        bank_account_id: String,
        kind: String,
        key: String,
        response: oneshot::Sender<Result<PixKey, ServiceError>>,
    },
    ListPixKeys {
        bank_account_id: String,
        response: oneshot::Sender<Result<Vec<PixKey>, ServiceError>>,
    },
    PixKeyExists {
        kind: String,
        key: String,
        response: oneshot::Sender<Result<bool, ServiceError>>,
    },
    FindPixKey {
        kind: String,
        key: String,
        response: oneshot::Sender<Result<PixKey, ServiceError>>,
    },
    DeactivatePixKey {
        id: String,
        response: oneshot::Sender<Result<PixKey, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct PixKeyRequestHandler {
    repository: Arc<dyn PixKeyRepository>,
    bank_accounts: Arc<dyn BankAccountRepository>,
}

impl PixKeyRequestHandler {
    pub fn new(
        repository: Arc<dyn PixKeyRepository>,
        bank_accounts: Arc<dyn BankAccountRepository>,
    ) -> Self {
        PixKeyRequestHandler {
            repository,
            bank_accounts,
        }
    }

    async fn ensure_bank_account(&self, bank_account_id: &str) -> Result<(), ServiceError> {
        match self.bank_accounts.get_bank_account(bank_account_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!(
                "Bank account {}.",
                bank_account_id
            ))),
        }
    }

    async fn create_pix_key(
        &self,
        bank_account_id: &str,
        kind: &str,
        key: &str,
    ) -> Result<PixKey, ServiceError> {
        let kind: PixKeyKind = kind.parse()?;
        self.ensure_bank_account(bank_account_id).await?;

        let pix_key = PixKey::new(kind, bank_account_id, key)?;
        let pix_key = self
            .repository
            .insert_pix_key(&pix_key)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => ServiceError::Conflict(format!(
                    "Pix key {} {} is already registered.",
                    pix_key.kind, pix_key.key
                )),
                e => e.into(),
            })?;

        log::info!(
            "Registered {} pix key {} for bank account {}.",
            pix_key.kind,
            pix_key.id,
            pix_key.bank_account_id
        );
        Ok(pix_key)
    }

    async fn list_pix_keys(&self, bank_account_id: &str) -> Result<Vec<PixKey>, ServiceError> {
        self.ensure_bank_account(bank_account_id).await?;

        Ok(self.repository.get_pix_keys_by_account(bank_account_id).await?)
    }

    async fn lookup(&self, kind: &str, key: &str) -> Result<Option<PixKey>, ServiceError> {
        let kind: PixKeyKind = kind.parse()?;
        let key = kind.normalize(key)?;

        Ok(self.repository.find_pix_key(kind, &key).await?)
    }

    async fn find_pix_key(&self, kind: &str, key: &str) -> Result<PixKey, ServiceError> {
        self.lookup(kind, key)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Pix key {} {}.", kind, key)))
    }

    async fn deactivate_pix_key(&self, id: &str) -> Result<PixKey, ServiceError> {
        let mut pix_key = self
            .repository
            .get_pix_key(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Pix key {}.", id)))?;
        let previous = pix_key.status;
        pix_key.deactivate()?;

        let pix_key = self
            .repository
            .update_pix_key_status(&pix_key, previous)
            .await?;

        log::info!("Deactivated pix key {}.", pix_key.id);
        Ok(pix_key)
    }
}

#[async_trait]
impl RequestHandler<PixKeyRequest> for PixKeyRequestHandler {
    async fn handle_request(&self, request: PixKeyRequest) {
        match request {
            PixKeyRequest::CreatePixKey {
                bank_account_id,
                kind,
                key,
                response,
            } => {
                let result = self.create_pix_key(&bank_account_id, &kind, &key).await;
                if let Err(e) = &result {
                    log::warn!("Could not register pix key for {}: {}", bank_account_id, e);
                }
                let _ = response.send(result);
            }
            PixKeyRequest::ListPixKeys {
                bank_account_id,
                response,
            } => {
                let result = self.list_pix_keys(&bank_account_id).await;
                let _ = response.send(result);
            }
            PixKeyRequest::PixKeyExists {
                kind,
                key,
                response,
            } => {
                let result = self.lookup(&kind, &key).await.map(|k| k.is_some());
                let _ = response.send(result);
            }
            PixKeyRequest::FindPixKey {
                kind,
                key,
                response,
            } => {
                let result = self.find_pix_key(&kind, &key).await;
                let _ = response.send(result);
            }
            PixKeyRequest::DeactivatePixKey { id, response } => {
                let result = self.deactivate_pix_key(&id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct PixKeysService;

impl PixKeysService {
    pub fn new() -> Self {
        PixKeysService {}
    }
}

#[async_trait]
impl Service<PixKeyRequest, PixKeyRequestHandler> for PixKeysService {}
