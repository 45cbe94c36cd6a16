use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::modules::Entity;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, sqlx::FromRow)]
pub struct Bank {
    pub id: String,
    pub code: String,
    pub name: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Entity for Bank {
    const NAME: &'static str = "Bank";
    const TABLE: &'static str = "banks";
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewBank {
    pub code: String,
    pub name: String,
}

impl NewBank {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.code.trim().is_empty() {
            return Err(ModelError::Empty("code"));
        }
        if self.name.trim().is_empty() {
            return Err(ModelError::Empty("name"));
        }

        Ok(())
    }
}
