//! Composition units. A module groups the entities it persists, the
//! controllers that expose it over HTTP and the services backing those
//! controllers. The registry checks every declaration when the application
//! starts, so a module referencing a service that was never started or an
//! entity whose table does not exist fails before any request is served.

use std::collections::HashSet;

use axum::Router;
use thiserror::Error;

use crate::repositories::SchemaCatalog;
use crate::services::http::AppState;

pub mod bank_accounts;
pub mod pix_keys;
pub mod transactions;

pub use bank_accounts::BankAccountsModule;
pub use pix_keys::PixKeysModule;
pub use transactions::TransactionsModule;

/// A persisted record type and the table backing it.
pub trait Entity {
    const NAME: &'static str;
    const TABLE: &'static str;

    fn descriptor() -> EntityDescriptor
    where
        Self: Sized,
    {
        EntityDescriptor {
            name: Self::NAME,
            table: Self::TABLE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub table: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct Controller {
    pub name: &'static str,
    pub routes: fn() -> Router<AppState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Provider {
    pub name: &'static str,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("Module {0} declares no controller")]
    MissingController(&'static str),
    #[error("Module {0} declares no provider")]
    MissingProvider(&'static str),
    #[error("Module {0} declares no entity")]
    MissingEntity(&'static str),
    #[error("Module {module} declares entity {entity} more than once")]
    DuplicateEntity {
        module: &'static str,
        entity: &'static str,
    },
    #[error("Module {0} is already registered")]
    DuplicateModule(&'static str),
    #[error("Module {module} depends on provider {provider}, which was never started")]
    UnresolvedProvider {
        module: &'static str,
        provider: &'static str,
    },
    #[error("Entity {entity} has no table {table}")]
    MissingTable {
        entity: &'static str,
        table: &'static str,
    },
    #[error("Could not inspect storage: {0}")]
    Catalog(String),
}

#[derive(Clone, Debug)]
pub struct ModuleDefinition {
    pub name: &'static str,
    pub entities: Vec<EntityDescriptor>,
    pub controllers: Vec<Controller>,
    pub providers: Vec<Provider>,
}

impl ModuleDefinition {
    pub fn builder(name: &'static str) -> ModuleBuilder {
        ModuleBuilder {
            name,
            entities: Vec::new(),
            controllers: Vec::new(),
            providers: Vec::new(),
        }
    }
}

pub struct ModuleBuilder {
    name: &'static str,
    entities: Vec<EntityDescriptor>,
    controllers: Vec<Controller>,
    providers: Vec<Provider>,
}

impl ModuleBuilder {
    pub fn entity<E: Entity>(mut self) -> Self {
        self.entities.push(E::descriptor());
        self
    }

    pub fn controller(mut self, name: &'static str, routes: fn() -> Router<AppState>) -> Self {
        self.controllers.push(Controller { name, routes });
        self
    }

    pub fn provider(mut self, name: &'static str) -> Self {
        self.providers.push(Provider { name });
        self
    }

    pub fn build(self) -> Result<ModuleDefinition, ModuleError> {
        if self.controllers.is_empty() {
            return Err(ModuleError::MissingController(self.name));
        }
        if self.providers.is_empty() {
            return Err(ModuleError::MissingProvider(self.name));
        }
        if self.entities.is_empty() {
            return Err(ModuleError::MissingEntity(self.name));
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name) {
                return Err(ModuleError::DuplicateEntity {
                    module: self.name,
                    entity: entity.name,
                });
            }
        }

        Ok(ModuleDefinition {
            name: self.name,
            entities: self.entities,
            controllers: self.controllers,
            providers: self.providers,
        })
    }
}

#[derive(Default)]
pub struct ModuleRegistry {
    started_providers: HashSet<&'static str>,
    modules: Vec<ModuleDefinition>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the service named `name` is running and can back modules.
    pub fn provide(&mut self, name: &'static str) {
        self.started_providers.insert(name);
    }

    pub async fn register(
        &mut self,
        definition: ModuleDefinition,
        catalog: &dyn SchemaCatalog,
    ) -> Result<(), ModuleError> {
        if self.modules.iter().any(|m| m.name == definition.name) {
            return Err(ModuleError::DuplicateModule(definition.name));
        }

        for provider in &definition.providers {
            if !self.started_providers.contains(provider.name) {
                return Err(ModuleError::UnresolvedProvider {
                    module: definition.name,
                    provider: provider.name,
                });
            }
        }

        for entity in &definition.entities {
            let exists = catalog
                .has_table(entity.table)
                .await
                .map_err(|e| ModuleError::Catalog(e.to_string()))?;
            if !exists {
                return Err(ModuleError::MissingTable {
                    entity: entity.name,
                    table: entity.table,
                });
            }
        }

        log::info!(
            "Registered module {} ({} controller(s), {} provider(s), entities: {}).",
            definition.name,
            definition.controllers.len(),
            definition.providers.len(),
            definition
                .entities
                .iter()
                .map(|e| e.name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.modules.push(definition);

        Ok(())
    }

    pub fn modules(&self) -> &[ModuleDefinition] {
        &self.modules
    }

    /// Routes of every controller declared by the registered modules.
    pub fn router(&self) -> Router<AppState> {
        self.modules
            .iter()
            .flat_map(|m| m.controllers.iter())
            .fold(Router::new(), |router, controller| {
                router.merge((controller.routes)())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bank_accounts::BankAccount;
    use crate::models::banks::Bank;
    use crate::models::pix_keys::PixKey;
    use crate::repositories::memory::InMemoryStore;
    use crate::repositories::RepositoryError;
    use async_trait::async_trait;

    struct EmptyCatalog;

    #[async_trait]
    impl SchemaCatalog for EmptyCatalog {
        async fn has_table(&self, _table: &str) -> Result<bool, RepositoryError> {
            Ok(false)
        }
    }

    fn no_routes() -> Router<AppState> {
        Router::new()
    }

    #[test]
    fn pix_keys_module_declares_one_controller_one_service_two_entities() {
        let definition = PixKeysModule::definition().unwrap();

        assert_eq!(definition.name, "PixKeysModule");
        assert_eq!(definition.controllers.len(), 1);
        assert_eq!(definition.controllers[0].name, "PixKeysController");
        assert_eq!(
            definition.providers,
            vec![Provider {
                name: "PixKeysService"
            }]
        );
        assert_eq!(
            definition.entities,
            vec![PixKey::descriptor(), BankAccount::descriptor()]
        );
    }

    #[tokio::test]
    async fn bank_accounts_module_owns_banks_table() {
        let definition = BankAccountsModule::definition().unwrap();
        assert_eq!(
            definition.entities,
            vec![BankAccount::descriptor(), Bank::descriptor()]
        );

        let mut registry = ModuleRegistry::new();
        registry.provide(BankAccountsModule::PROVIDER);
        registry
            .register(definition, &InMemoryStore::new())
            .await
            .unwrap();
        assert_eq!(registry.modules().len(), 1);
    }

    #[test]
    fn builder_rejects_incomplete_declarations() {
        assert_eq!(
            ModuleDefinition::builder("Empty")
                .provider("S")
                .entity::<PixKey>()
                .build()
                .unwrap_err(),
            ModuleError::MissingController("Empty")
        );
        assert_eq!(
            ModuleDefinition::builder("Empty")
                .controller("C", no_routes)
                .entity::<PixKey>()
                .build()
                .unwrap_err(),
            ModuleError::MissingProvider("Empty")
        );
        assert_eq!(
            ModuleDefinition::builder("Empty")
                .controller("C", no_routes)
                .provider("S")
                .build()
                .unwrap_err(),
            ModuleError::MissingEntity("Empty")
        );
        assert_eq!(
            ModuleDefinition::builder("Twice")
                .controller("C", no_routes)
                .provider("S")
                .entity::<PixKey>()
                .entity::<PixKey>()
                .build()
                .unwrap_err(),
            ModuleError::DuplicateEntity {
                module: "Twice",
                entity: "PixKey"
            }
        );
    }

    #[tokio::test]
    async fn registration_requires_started_provider() {
        let mut registry = ModuleRegistry::new();
        let catalog = InMemoryStore::new();

        let result = registry
            .register(PixKeysModule::definition().unwrap(), &catalog)
            .await;

        assert_eq!(
            result,
            Err(ModuleError::UnresolvedProvider {
                module: "PixKeysModule",
                provider: "PixKeysService"
            })
        );
        assert!(registry.modules().is_empty());
    }

    #[tokio::test]
    async fn registration_requires_entity_tables() {
        let mut registry = ModuleRegistry::new();
        registry.provide("PixKeysService");

        let result = registry
            .register(PixKeysModule::definition().unwrap(), &EmptyCatalog)
            .await;

        assert_eq!(
            result,
            Err(ModuleError::MissingTable {
                entity: "PixKey",
                table: "pix_keys"
            })
        );
    }

    #[tokio::test]
    async fn registration_rejects_same_module_twice() {
        let mut registry = ModuleRegistry::new();
        let catalog = InMemoryStore::new();
        registry.provide("PixKeysService");

        registry
            .register(PixKeysModule::definition().unwrap(), &catalog)
            .await
            .unwrap();
        let result = registry
            .register(PixKeysModule::definition().unwrap(), &catalog)
            .await;

        assert_eq!(result, Err(ModuleError::DuplicateModule("PixKeysModule")));
        assert_eq!(registry.modules().len(), 1);
    }
}
