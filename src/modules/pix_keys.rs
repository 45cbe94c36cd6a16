use super::{ModuleDefinition, ModuleError};
use crate::models::bank_accounts::BankAccount;
use crate::models::pix_keys::PixKey;
use crate::services::http::pix_keys as controller;

/// PIX keys and the bank accounts that own them, exposed by
/// `PixKeysController` and backed by `PixKeysService`.
pub struct PixKeysModule;

impl PixKeysModule {
    pub const NAME: &'static str = "PixKeysModule";
    pub const CONTROLLER: &'static str = "PixKeysController";
    pub const PROVIDER: &'static str = "PixKeysService";

    pub fn definition() -> Result<ModuleDefinition, ModuleError> {
        ModuleDefinition::builder(Self::NAME)
            .entity::<PixKey>()
            .entity::<BankAccount>()
            .controller(Self::CONTROLLER, controller::routes)
            .provider(Self::PROVIDER)
            .build()
    }
}
