use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pix_keys::{PixKey, PixKeyStatus};
use super::ModelError;
use crate::modules::Entity;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Completed,
    Error,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Error => "error",
        }
    }
}

impl TryFrom<String> for TransactionStatus {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, ModelError> {
        match value.as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "confirmed" => Ok(TransactionStatus::Confirmed),
            "completed" => Ok(TransactionStatus::Completed),
            "error" => Ok(TransactionStatus::Error),
            _ => Err(ModelError::InvalidStatus(value)),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub bank_account_from_id: String,
    pub pix_key_id_to: String,
    pub amount_in_cents: i64,
    #[sqlx(try_from = "String")]
    pub status: TransactionStatus,
    pub description: String,
    pub cancel_description: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Entity for Transaction {
    const NAME: &'static str = "Transaction";
    const TABLE: &'static str = "transactions";
}

impl Transaction {
    pub fn new(
        bank_account_from_id: &str,
        amount_in_cents: i64,
        pix_key_to: &PixKey,
        description: &str,
    ) -> Result<Self, ModelError> {
        if amount_in_cents <= 0 {
            return Err(ModelError::NonPositiveAmount);
        }

        if pix_key_to.bank_account_id == bank_account_from_id {
            return Err(ModelError::SameAccount);
        }

        if pix_key_to.status != PixKeyStatus::Active {
            return Err(ModelError::InactivePixKey(pix_key_to.id.clone()));
        }

        let now = chrono::Utc::now().naive_utc();

        Ok(Transaction {
            id: Uuid::new_v4().hyphenated().to_string(),
            bank_account_from_id: bank_account_from_id.to_string(),
            pix_key_id_to: pix_key_to.id.clone(),
            amount_in_cents,
            status: TransactionStatus::Pending,
            description: description.to_string(),
            cancel_description: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn confirm(&mut self) -> Result<(), ModelError> {
        self.transition("confirm", &[TransactionStatus::Pending], TransactionStatus::Confirmed)
    }

    pub fn complete(&mut self) -> Result<(), ModelError> {
        self.transition(
            "complete",
            &[TransactionStatus::Confirmed],
            TransactionStatus::Completed,
        )
    }

    pub fn cancel(&mut self, description: &str) -> Result<(), ModelError> {
        self.transition(
            "cancel",
            &[TransactionStatus::Pending, TransactionStatus::Confirmed],
            TransactionStatus::Error,
        )?;
        self.cancel_description = Some(description.to_string());

        Ok(())
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: &[TransactionStatus],
        to: TransactionStatus,
    ) -> Result<(), ModelError> {
        if !from.contains(&self.status) {
            return Err(ModelError::InvalidTransition {
                action,
                status: self.status.as_str().to_string(),
            });
        }

        self.status = to;
        self.updated_at = chrono::Utc::now().naive_utc();

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTransaction {
    pub pix_key_kind: String,
    pub pix_key: String,
    pub amount_in_cents: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CancelTransaction {
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pix_keys::PixKeyKind;
    use rstest::rstest;

    fn destination() -> PixKey {
        PixKey::new(PixKeyKind::Email, "account-to", "j@j.com").unwrap()
    }

    #[test]
    fn new_transaction_is_pending() {
        let transaction = Transaction::new("account-from", 1000, &destination(), "rent").unwrap();

        assert_eq!(transaction.status, TransactionStatus::Pending);
        assert_eq!(transaction.amount_in_cents, 1000);
        assert_eq!(transaction.description, "rent");
        assert!(transaction.cancel_description.is_none());
    }

    #[test]
    fn rejects_non_positive_amount() {
        assert_eq!(
            Transaction::new("account-from", 0, &destination(), ""),
            Err(ModelError::NonPositiveAmount)
        );
        assert_eq!(
            Transaction::new("account-from", -10, &destination(), ""),
            Err(ModelError::NonPositiveAmount)
        );
    }

    #[test]
    fn rejects_inactive_destination_key() {
        let mut pix_key = destination();
        pix_key.deactivate().unwrap();

        assert_eq!(
            Transaction::new("account-from", 1000, &pix_key, ""),
            Err(ModelError::InactivePixKey(pix_key.id.clone()))
        );
    }

    #[rstest]
    #[case("pending", Ok(TransactionStatus::Pending))]
    #[case("confirmed", Ok(TransactionStatus::Confirmed))]
    #[case("completed", Ok(TransactionStatus::Completed))]
    #[case("error", Ok(TransactionStatus::Error))]
    #[case("done", Err(ModelError::InvalidStatus("done".to_string())))]
    fn reads_stored_status(
        #[case] raw: &str,
        #[case] expected: Result<TransactionStatus, ModelError>,
    ) {
        assert_eq!(TransactionStatus::try_from(raw.to_string()), expected);
    }

    #[test]
    fn rejects_transfer_to_own_account() {
        assert_eq!(
            Transaction::new("account-to", 1000, &destination(), ""),
            Err(ModelError::SameAccount)
        );
    }

    #[test]
    fn follows_confirm_then_complete() {
        let mut transaction = Transaction::new("account-from", 1000, &destination(), "").unwrap();

        assert!(transaction.complete().is_err());
        transaction.confirm().unwrap();
        assert_eq!(transaction.status, TransactionStatus::Confirmed);
        transaction.complete().unwrap();
        assert_eq!(transaction.status, TransactionStatus::Completed);

        assert_eq!(
            transaction.cancel("too late"),
            Err(ModelError::InvalidTransition {
                action: "cancel",
                status: "completed".to_string()
            })
        );
    }

    #[test]
    fn cancel_records_reason_and_is_terminal() {
        let mut transaction = Transaction::new("account-from", 1000, &destination(), "rent").unwrap();

        transaction.cancel("insufficient funds").unwrap();
        assert_eq!(transaction.status, TransactionStatus::Error);
        assert_eq!(transaction.description, "rent");
        assert_eq!(
            transaction.cancel_description.as_deref(),
            Some("insufficient funds")
        );
        assert!(transaction.confirm().is_err());
    }
}
