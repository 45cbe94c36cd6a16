use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub storage: Storage,
    pub postgres: Option<Postgres>,
}

impl Settings {
    /// Reads `path`, then lets `PIX_`-prefixed environment variables override
    /// it (`PIX_POSTGRES__URL` sets `postgres.url`).
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Self::load(File::with_name(path), environment())
    }

    fn load<S>(source: S, environment: Environment) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .set_default("server.listen", "0.0.0.0:8080")?
            .set_default("storage.backend", "postgres")?
            .add_source(source)
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PIX")
        .prefix_separator("_")
        .separator("__")
}
