use super::{ModuleDefinition, ModuleError};
use crate::models::bank_accounts::BankAccount;
use crate::models::banks::Bank;
use crate::services::http::bank_accounts as controller;

pub struct BankAccountsModule;

impl BankAccountsModule {
    pub const NAME: &'static str = "BankAccountsModule";
    pub const CONTROLLER: &'static str = "BankAccountsController";
    pub const PROVIDER: &'static str = "BankAccountsService";

    pub fn definition() -> Result<ModuleDefinition, ModuleError> {
        ModuleDefinition::builder(Self::NAME)
            .entity::<BankAccount>()
            .entity::<Bank>()
            .controller(Self::CONTROLLER, controller::routes)
            .provider(Self::PROVIDER)
            .build()
    }
}
