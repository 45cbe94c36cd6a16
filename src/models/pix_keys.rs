use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ModelError;
use crate::modules::Entity;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PixKeyKind {
    Cpf,
    Email,
}

impl PixKeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixKeyKind::Cpf => "cpf",
            PixKeyKind::Email => "email",
        }
    }

    /// Returns `key` in its stored form. Only blank keys are rejected; the
    /// format of the key is not checked against its kind. Punctuated CPFs
    /// (`529.982.247-25`) are stored as bare digits and emails are lowercased.
    pub fn normalize(&self, key: &str) -> Result<String, ModelError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ModelError::Empty("key"));
        }

        let normalized = match self {
            PixKeyKind::Cpf if is_punctuated_number(key) => {
                key.chars().filter(char::is_ascii_digit).collect()
            }
            PixKeyKind::Cpf => key.to_string(),
            PixKeyKind::Email => key.to_lowercase(),
        };

        Ok(normalized)
    }
}

impl fmt::Display for PixKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixKeyKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpf" => Ok(PixKeyKind::Cpf),
            "email" => Ok(PixKeyKind::Email),
            other => Err(ModelError::InvalidKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for PixKeyKind {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PixKeyStatus {
    Active,
    Inactive,
}

impl PixKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixKeyStatus::Active => "active",
            PixKeyStatus::Inactive => "inactive",
        }
    }
}

impl TryFrom<String> for PixKeyStatus {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(PixKeyStatus::Active),
            "inactive" => Ok(PixKeyStatus::Inactive),
            _ => Err(ModelError::InvalidStatus(value)),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, sqlx::FromRow)]
pub struct PixKey {
    pub id: String,
    #[sqlx(try_from = "String")]
    pub kind: PixKeyKind,
    pub key: String,
    pub bank_account_id: String,
    #[sqlx(try_from = "String")]
    pub status: PixKeyStatus,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Entity for PixKey {
    const NAME: &'static str = "PixKey";
    const TABLE: &'static str = "pix_keys";
}

impl PixKey {
    pub fn new(kind: PixKeyKind, bank_account_id: &str, key: &str) -> Result<Self, ModelError> {
        if bank_account_id.trim().is_empty() {
            return Err(ModelError::Empty("bank_account_id"));
        }

        let key = kind.normalize(key)?;
        let now = chrono::Utc::now().naive_utc();

        Ok(PixKey {
            id: Uuid::new_v4().hyphenated().to_string(),
            kind,
            key,
            bank_account_id: bank_account_id.to_string(),
            status: PixKeyStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Takes the key out of use. Inactive keys stay registered, so the same
    /// kind and value cannot be claimed again, but no longer receive transfers.
    pub fn deactivate(&mut self) -> Result<(), ModelError> {
        if self.status == PixKeyStatus::Inactive {
            return Err(ModelError::AlreadyInactive(self.id.clone()));
        }

        self.status = PixKeyStatus::Inactive;
        self.updated_at = chrono::Utc::now().naive_utc();

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewPixKey {
    pub kind: String,
    pub key: String,
}

fn is_punctuated_number(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_digit())
        && key
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn new_pix_key_is_active_with_fresh_id() {
        let pix_key = PixKey::new(PixKeyKind::Email, "account-1", "j@j.com").unwrap();

        assert!(Uuid::parse_str(&pix_key.id).is_ok());
        assert_eq!(pix_key.kind, PixKeyKind::Email);
        assert_eq!(pix_key.status, PixKeyStatus::Active);
        assert_eq!(pix_key.bank_account_id, "account-1");
    }

    #[rstest]
    #[case("email", Ok(PixKeyKind::Email))]
    #[case("cpf", Ok(PixKeyKind::Cpf))]
    #[case("nome", Err(ModelError::InvalidKind("nome".to_string())))]
    #[case("EMAIL", Err(ModelError::InvalidKind("EMAIL".to_string())))]
    fn parses_kind(#[case] raw: &str, #[case] expected: Result<PixKeyKind, ModelError>) {
        assert_eq!(raw.parse::<PixKeyKind>(), expected);
    }

    #[rstest]
    #[case(PixKeyKind::Cpf, "529.982.247-25", "52998224725")]
    #[case(PixKeyKind::Cpf, "52998224725", "52998224725")]
    #[case(PixKeyKind::Cpf, "12345678900", "12345678900")]
    #[case(PixKeyKind::Cpf, "j@j.com", "j@j.com")]
    #[case(PixKeyKind::Email, " J@J.com ", "j@j.com")]
    #[case(PixKeyKind::Email, "lucas", "lucas")]
    fn stores_keys_without_checking_format(
        #[case] kind: PixKeyKind,
        #[case] raw: &str,
        #[case] stored: &str,
    ) {
        assert_eq!(kind.normalize(raw).unwrap(), stored);
    }

    #[test]
    fn cpf_kind_accepts_any_non_blank_key() {
        let pix_key = PixKey::new(PixKeyKind::Cpf, "account-1", "j@j.com").unwrap();

        assert_eq!(pix_key.kind, PixKeyKind::Cpf);
        assert_eq!(pix_key.key, "j@j.com");
    }

    #[test]
    fn deactivates_once() {
        let mut pix_key = PixKey::new(PixKeyKind::Email, "account-1", "j@j.com").unwrap();

        pix_key.deactivate().unwrap();
        assert_eq!(pix_key.status, PixKeyStatus::Inactive);
        assert_eq!(
            pix_key.deactivate(),
            Err(ModelError::AlreadyInactive(pix_key.id.clone()))
        );
    }

    #[test]
    fn rejects_blank_key() {
        assert_eq!(
            PixKey::new(PixKeyKind::Email, "account-1", "   "),
            Err(ModelError::Empty("key"))
        );
    }
}
