use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    BankAccountRepository, BankRepository, PixKeyRepository, RepositoryError, SchemaCatalog,
    TransactionRepository,
};
use crate::models::bank_accounts::{BankAccount, NewBankAccount};
use crate::models::banks::{Bank, NewBank};
use crate::models::pix_keys::{PixKey, PixKeyKind, PixKeyStatus};
use crate::models::transactions::{Transaction, TransactionStatus};
use crate::modules::Entity;

/// Process-local storage backend. All writes go through `write_lock` so
/// uniqueness checks and balance transfers see a consistent view.
pub struct InMemoryStore {
    banks: DashMap<String, Bank>,
    bank_accounts: DashMap<String, BankAccount>,
    pix_keys: DashMap<String, PixKey>,
    transactions: DashMap<String, Transaction>,
    write_lock: Mutex<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            banks: DashMap::new(),
            bank_accounts: DashMap::new(),
            pix_keys: DashMap::new(),
            transactions: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    fn update_status(
        &self,
        transaction: &Transaction,
        previous: TransactionStatus,
    ) -> Result<Transaction, RepositoryError> {
        let mut stored = self
            .transactions
            .get_mut(&transaction.id)
            .ok_or_else(|| RepositoryError::NotFound(transaction.id.clone()))?;

        if stored.status != previous {
            return Err(RepositoryError::StaleState(transaction.id.clone()));
        }

        stored.status = transaction.status;
        stored.cancel_description = transaction.cancel_description.clone();
        stored.updated_at = transaction.updated_at;

        Ok(stored.value().clone())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankRepository for InMemoryStore {
    async fn insert_bank(&self, bank: &NewBank) -> Result<Bank, RepositoryError> {
        let _guard = self.write_lock.lock().await;

        if self.banks.iter().any(|b| b.code == bank.code) {
            return Err(RepositoryError::Duplicate(bank.code.clone()));
        }

        let now = chrono::Utc::now().naive_utc();
        let bank = Bank {
            id: Uuid::new_v4().hyphenated().to_string(),
            code: bank.code.clone(),
            name: bank.name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.banks.insert(bank.id.clone(), bank.clone());

        Ok(bank)
    }

    async fn get_bank(&self, id: &str) -> Result<Option<Bank>, RepositoryError> {
        Ok(self.banks.get(id).map(|b| b.value().clone()))
    }

    async fn list_banks(&self) -> Result<Vec<Bank>, RepositoryError> {
        let mut banks: Vec<Bank> = self.banks.iter().map(|b| b.value().clone()).collect();
        banks.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(banks)
    }
}

#[async_trait]
impl BankAccountRepository for InMemoryStore {
    async fn insert_bank_account(
        &self,
        account: &NewBankAccount,
    ) -> Result<BankAccount, RepositoryError> {
        let _guard = self.write_lock.lock().await;

        if !self.banks.contains_key(&account.bank_id) {
            return Err(RepositoryError::NotFound(account.bank_id.clone()));
        }

        if self
            .bank_accounts
            .iter()
            .any(|a| a.account_number == account.account_number)
        {
            return Err(RepositoryError::Duplicate(account.account_number.clone()));
        }

        let now = chrono::Utc::now().naive_utc();
        let bank_account = BankAccount {
            id: Uuid::new_v4().hyphenated().to_string(),
            bank_id: account.bank_id.clone(),
            account_number: account.account_number.clone(),
            owner_name: account.owner_name.clone(),
            balance_in_cents: account.balance_in_cents,
            created_at: now,
            updated_at: now,
        };
        self.bank_accounts
            .insert(bank_account.id.clone(), bank_account.clone());

        Ok(bank_account)
    }

    async fn get_bank_account(&self, id: &str) -> Result<Option<BankAccount>, RepositoryError> {
        Ok(self.bank_accounts.get(id).map(|a| a.value().clone()))
    }

    async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, RepositoryError> {
        let mut bank_accounts: Vec<BankAccount> =
            self.bank_accounts.iter().map(|a| a.value().clone()).collect();
        bank_accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(bank_accounts)
    }
}

#[async_trait]
impl PixKeyRepository for InMemoryStore {
    async fn insert_pix_key(&self, pix_key: &PixKey) -> Result<PixKey, RepositoryError> {
        let _guard = self.write_lock.lock().await;

        if !self.bank_accounts.contains_key(&pix_key.bank_account_id) {
            return Err(RepositoryError::NotFound(pix_key.bank_account_id.clone()));
        }

        if self
            .pix_keys
            .iter()
            .any(|k| k.kind == pix_key.kind && k.key == pix_key.key)
        {
            return Err(RepositoryError::Duplicate(format!(
                "{}:{}",
                pix_key.kind, pix_key.key
            )));
        }

        self.pix_keys.insert(pix_key.id.clone(), pix_key.clone());

        Ok(pix_key.clone())
    }

    async fn get_pix_keys_by_account(
        &self,
        bank_account_id: &str,
    ) -> Result<Vec<PixKey>, RepositoryError> {
        let mut pix_keys: Vec<PixKey> = self
            .pix_keys
            .iter()
            .filter(|k| k.bank_account_id == bank_account_id)
            .map(|k| k.value().clone())
            .collect();
        pix_keys.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(pix_keys)
    }

    async fn get_pix_key(&self, id: &str) -> Result<Option<PixKey>, RepositoryError> {
        Ok(self.pix_keys.get(id).map(|k| k.value().clone()))
    }

    async fn find_pix_key(
        &self,
        kind: PixKeyKind,
        key: &str,
    ) -> Result<Option<PixKey>, RepositoryError> {
        Ok(self
            .pix_keys
            .iter()
            .find(|k| k.kind == kind && k.key == key)
            .map(|k| k.value().clone()))
    }

    async fn update_pix_key_status(
        &self,
        pix_key: &PixKey,
        previous: PixKeyStatus,
    ) -> Result<PixKey, RepositoryError> {
        let _guard = self.write_lock.lock().await;

        let mut stored = self
            .pix_keys
            .get_mut(&pix_key.id)
            .ok_or_else(|| RepositoryError::NotFound(pix_key.id.clone()))?;

        if stored.status != previous {
            return Err(RepositoryError::StaleState(pix_key.id.clone()));
        }

        stored.status = pix_key.status;
        stored.updated_at = pix_key.updated_at;

        Ok(stored.value().clone())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn insert_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, RepositoryError> {
        let _guard = self.write_lock.lock().await;

        if self.transactions.contains_key(&transaction.id) {
            return Err(RepositoryError::Duplicate(transaction.id.clone()));
        }
        self.transactions
            .insert(transaction.id.clone(), transaction.clone());

        Ok(transaction.clone())
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self.transactions.get(id).map(|t| t.value().clone()))
    }

    async fn update_transaction_status(
        &self,
        transaction: &Transaction,
        previous: TransactionStatus,
    ) -> Result<Transaction, RepositoryError> {
        let _guard = self.write_lock.lock().await;

        self.update_status(transaction, previous)
    }

    async fn complete_transaction(
        &self,
        transaction: &Transaction,
        previous: TransactionStatus,
    ) -> Result<Transaction, RepositoryError> {
        let _guard = self.write_lock.lock().await;

        let account_to = self
            .pix_keys
            .get(&transaction.pix_key_id_to)
            .map(|k| k.bank_account_id.clone())
            .ok_or_else(|| RepositoryError::NotFound(transaction.pix_key_id_to.clone()))?;

        match self.transactions.get(&transaction.id) {
            Some(stored) if stored.status != previous => {
                return Err(RepositoryError::StaleState(transaction.id.clone()))
            }
            Some(_) => {}
            None => return Err(RepositoryError::NotFound(transaction.id.clone())),
        }

        let balance_of = |account_id: &str| {
            self.bank_accounts
                .get(account_id)
                .map(|a| a.balance_in_cents)
                .ok_or_else(|| RepositoryError::NotFound(account_id.to_string()))
        };
        let balance_from = balance_of(&transaction.bank_account_from_id)?;
        let balance_to = balance_of(&account_to)?;

        // Both balances are computed before either account is touched.
        let balance_from = balance_from
            .checked_sub(transaction.amount_in_cents)
            .filter(|balance| *balance >= 0)
            .ok_or_else(|| {
                RepositoryError::InsufficientBalance(transaction.bank_account_from_id.clone())
            })?;
        let balance_to = balance_to
            .checked_add(transaction.amount_in_cents)
            .ok_or_else(|| RepositoryError::BalanceOverflow(account_to.clone()))?;

        for (account_id, balance) in [
            (&transaction.bank_account_from_id, balance_from),
            (&account_to, balance_to),
        ] {
            if let Some(mut account) = self.bank_accounts.get_mut(account_id) {
                account.balance_in_cents = balance;
                account.updated_at = transaction.updated_at;
            }
        }

        self.update_status(transaction, previous)
    }
}

#[async_trait]
impl SchemaCatalog for InMemoryStore {
    async fn has_table(&self, table: &str) -> Result<bool, RepositoryError> {
        Ok([
            Bank::TABLE,
            BankAccount::TABLE,
            PixKey::TABLE,
            Transaction::TABLE,
        ]
        .contains(&table))
    }
}
