use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::modules::Entity;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, sqlx::FromRow)]
pub struct BankAccount {
    pub id: String,
    pub bank_id: String,
    pub account_number: String,
    pub owner_name: String,
    pub balance_in_cents: i64,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Entity for BankAccount {
    const NAME: &'static str = "BankAccount";
    const TABLE: &'static str = "bank_accounts";
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewBankAccount {
    pub bank_id: String,
    pub account_number: String,
    pub owner_name: String,
    #[serde(default)]
    pub balance_in_cents: i64,
}

impl NewBankAccount {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.bank_id.trim().is_empty() {
            return Err(ModelError::Empty("bank_id"));
        }
        if self.account_number.trim().is_empty() {
            return Err(ModelError::Empty("account_number"));
        }
        if self.owner_name.trim().is_empty() {
            return Err(ModelError::Empty("owner_name"));
        }
        if self.balance_in_cents < 0 {
            return Err(ModelError::NegativeBalance);
        }

        Ok(())
    }
}
