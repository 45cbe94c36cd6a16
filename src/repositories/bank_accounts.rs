use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BankAccountRepository, RepositoryError};
use crate::models::bank_accounts::{BankAccount, NewBankAccount};

#[derive(Clone)]
pub struct PgBankAccountRepository {
    conn: PgPool,
}

impl PgBankAccountRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl BankAccountRepository for PgBankAccountRepository {
    async fn insert_bank_account(
        &self,
        account: &NewBankAccount,
    ) -> Result<BankAccount, RepositoryError> {
        let account_id = Uuid::new_v4().hyphenated().to_string();

        let bank_account = sqlx::query_as::<_, BankAccount>(
            r#"
                INSERT INTO bank_accounts (id, bank_id, account_number, owner_name, balance_in_cents)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            "#,
        )
        .bind(&account_id)
        .bind(&account.bank_id)
        .bind(&account.account_number)
        .bind(&account.owner_name)
        .bind(account.balance_in_cents)
        .fetch_one(&self.conn)
        .await?;

        Ok(bank_account)
    }

    async fn get_bank_account(&self, id: &str) -> Result<Option<BankAccount>, RepositoryError> {
        let bank_account =
            sqlx::query_as::<_, BankAccount>("SELECT * FROM bank_accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(bank_account)
    }

    async fn list_bank_accounts(&self) -> Result<Vec<BankAccount>, RepositoryError> {
        let bank_accounts =
            sqlx::query_as::<_, BankAccount>("SELECT * FROM bank_accounts ORDER BY created_at")
                .fetch_all(&self.conn)
                .await?;

        Ok(bank_accounts)
    }
}
