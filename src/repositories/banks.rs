use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BankRepository, RepositoryError};
use crate::models::banks::{Bank, NewBank};

#[derive(Clone)]
pub struct PgBankRepository {
    conn: PgPool,
}

impl PgBankRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl BankRepository for PgBankRepository {
    async fn insert_bank(&self, bank: &NewBank) -> Result<Bank, RepositoryError> {
        let bank = sqlx::query_as::<_, Bank>(
            "INSERT INTO banks (id, code, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4().hyphenated().to_string())
        .bind(&bank.code)
        .bind(&bank.name)
        .fetch_one(&self.conn)
        .await?;

        Ok(bank)
    }

    async fn get_bank(&self, id: &str) -> Result<Option<Bank>, RepositoryError> {
        let bank = sqlx::query_as::<_, Bank>("SELECT * FROM banks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(bank)
    }

    async fn list_banks(&self) -> Result<Vec<Bank>, RepositoryError> {
        let banks = sqlx::query_as::<_, Bank>("SELECT * FROM banks ORDER BY code")
            .fetch_all(&self.conn)
            .await?;

        Ok(banks)
    }
}
