use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, TransactionRepository};
use crate::models::transactions::{Transaction, TransactionStatus};

#[derive(Clone)]
pub struct PgTransactionRepository {
    conn: PgPool,
}

impl PgTransactionRepository {
    pub fn new(conn: PgPool) -> Self {
        PgTransactionRepository { conn }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn insert_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, RepositoryError> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"INSERT INTO transactions
            (id, bank_account_from_id, pix_key_id_to, amount_in_cents, status, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.bank_account_from_id)
        .bind(&transaction.pix_key_id_to)
        .bind(transaction.amount_in_cents)
        .bind(transaction.status.as_str())
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .fetch_one(&self.conn)
        .await?;

        Ok(transaction)
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, RepositoryError> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(transaction)
    }

    async fn update_transaction_status(
        &self,
        transaction: &Transaction,
        previous: TransactionStatus,
    ) -> Result<Transaction, RepositoryError> {
        let updated = sqlx::query_as::<_, Transaction>(
            r#"UPDATE transactions
            SET status = $1, cancel_description = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            RETURNING *"#,
        )
        .bind(transaction.status.as_str())
        .bind(&transaction.cancel_description)
        .bind(transaction.updated_at)
        .bind(&transaction.id)
        .bind(previous.as_str())
        .fetch_optional(&self.conn)
        .await?;

        updated.ok_or_else(|| RepositoryError::StaleState(transaction.id.clone()))
    }

    async fn complete_transaction(
        &self,
        transaction: &Transaction,
        previous: TransactionStatus,
    ) -> Result<Transaction, RepositoryError> {
        let mut tx = self.conn.begin().await?;

        let account_to: String =
            sqlx::query_scalar("SELECT bank_account_id FROM pix_keys WHERE id = $1")
                .bind(&transaction.pix_key_id_to)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| RepositoryError::NotFound(transaction.pix_key_id_to.clone()))?;

        // Lock both rows in id order so concurrent transfers cannot deadlock.
        let balances: Vec<(String, i64)> = sqlx::query_as(
            "SELECT id, balance_in_cents FROM bank_accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![transaction.bank_account_from_id.clone(), account_to.clone()])
        .fetch_all(&mut *tx)
        .await?;

        let balance_of = |account_id: &str| {
            balances
                .iter()
                .find(|(id, _)| id == account_id)
                .map(|(_, balance)| *balance)
                .ok_or_else(|| RepositoryError::NotFound(account_id.to_string()))
        };
        let balance_from = balance_of(&transaction.bank_account_from_id)?;
        let balance_to = balance_of(&account_to)?;

        if balance_from < transaction.amount_in_cents {
            return Err(RepositoryError::InsufficientBalance(
                transaction.bank_account_from_id.clone(),
            ));
        }
        if balance_to.checked_add(transaction.amount_in_cents).is_none() {
            return Err(RepositoryError::BalanceOverflow(account_to));
        }

        sqlx::query(
            "UPDATE bank_accounts SET balance_in_cents = balance_in_cents - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(transaction.amount_in_cents)
        .bind(&transaction.bank_account_from_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE bank_accounts SET balance_in_cents = balance_in_cents + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(transaction.amount_in_cents)
        .bind(&account_to)
        .execute(&mut *tx)
        .await?;

        let completed = sqlx::query_as::<_, Transaction>(
            "UPDATE transactions SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *",
        )
        .bind(transaction.status.as_str())
        .bind(transaction.updated_at)
        .bind(&transaction.id)
        .bind(previous.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::StaleState(transaction.id.clone()))?;

        tx.commit().await?;

        Ok(completed)
    }
}
