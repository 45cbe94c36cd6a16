use super::{ModuleDefinition, ModuleError};
use crate::models::bank_accounts::BankAccount;
use crate::models::pix_keys::PixKey;
use crate::models::transactions::Transaction;
use crate::services::http::transactions as controller;

/// Transfers from a bank account to a PIX key. Depends on the PIX keys
/// service to resolve destinations.
pub struct TransactionsModule;

impl TransactionsModule {
    pub const NAME: &'static str = "TransactionsModule";
    pub const CONTROLLER: &'static str = "TransactionsController";
    pub const PROVIDER: &'static str = "TransactionsService";

    pub fn definition() -> Result<ModuleDefinition, ModuleError> {
        ModuleDefinition::builder(Self::NAME)
            .entity::<Transaction>()
            .entity::<BankAccount>()
            .entity::<PixKey>()
            .controller(Self::CONTROLLER, controller::routes)
            .provider(Self::PROVIDER)
            .provider(super::PixKeysModule::PROVIDER)
            .build()
    }
}
