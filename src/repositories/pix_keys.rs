use async_trait::async_trait;
use sqlx::PgPool;

use super::{PixKeyRepository, RepositoryError};
use crate::models::pix_keys::{PixKey, PixKeyKind, PixKeyStatus};

#[derive(Clone)]
pub struct PgPixKeyRepository {
    conn: PgPool,
}

impl PgPixKeyRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl PixKeyRepository for PgPixKeyRepository {
    async fn insert_pix_key(&self, pix_key: &PixKey) -> Result<PixKey, RepositoryError> {
        let pix_key = sqlx::query_as::<_, PixKey>(
            r#"
                INSERT INTO pix_keys
                (id, kind, key, bank_account_id, status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            "#,
        )
        .bind(&pix_key.id)
        .bind(pix_key.kind.as_str())
        .bind(&pix_key.key)
        .bind(&pix_key.bank_account_id)
        .bind(pix_key.status.as_str())
        .bind(pix_key.created_at)
        .bind(pix_key.updated_at)
        .fetch_one(&self.conn)
        .await?;

        Ok(pix_key)
    }

    async fn get_pix_keys_by_account(
        &self,
        bank_account_id: &str,
    ) -> Result<Vec<PixKey>, RepositoryError> {
        let pix_keys = sqlx::query_as::<_, PixKey>(
            "SELECT * FROM pix_keys WHERE bank_account_id = $1 ORDER BY created_at",
        )
        .bind(bank_account_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(pix_keys)
    }

    async fn get_pix_key(&self, id: &str) -> Result<Option<PixKey>, RepositoryError> {
        let pix_key = sqlx::query_as::<_, PixKey>("SELECT * FROM pix_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(pix_key)
    }

    async fn find_pix_key(
        &self,
        kind: PixKeyKind,
        key: &str,
    ) -> Result<Option<PixKey>, RepositoryError> {
        let pix_key =
            sqlx::query_as::<_, PixKey>("SELECT * FROM pix_keys WHERE kind = $1 AND key = $2")
                .bind(kind.as_str())
                .bind(key)
                .fetch_optional(&self.conn)
                .await?;

        Ok(pix_key)
    }

    async fn update_pix_key_status(
        &self,
        pix_key: &PixKey,
        previous: PixKeyStatus,
    ) -> Result<PixKey, RepositoryError> {
        let updated = sqlx::query_as::<_, PixKey>(
            r#"UPDATE pix_keys
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            RETURNING *"#,
        )
        .bind(pix_key.status.as_str())
        .bind(pix_key.updated_at)
        .bind(&pix_key.id)
        .bind(previous.as_str())
        .fetch_optional(&self.conn)
        .await?;

        updated.ok_or_else(|| RepositoryError::StaleState(pix_key.id.clone()))
    }
}
