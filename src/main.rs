use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use pix_bank::repositories::Repositories;
use pix_bank::services::{self, http};
use pix_bank::settings::{Settings, StorageBackend};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    #[arg(short, long)]
    listen: Option<String>,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let settings = Settings::new(&args.config).expect("Could not load config file.");

    init_logging(&args.log4rs).expect("Failed to initialize logging.");
    log::info!("Starting pix bank service.");

    let repositories = match settings.storage.backend {
        StorageBackend::Postgres => {
            let postgres = settings
                .postgres
                .as_ref()
                .ok_or_else(|| anyhow!("Storage backend is postgres but [postgres] is missing."))?;
            let conn = PgPoolOptions::new()
                .max_connections(postgres.max_connections)
                .connect(&postgres.url)
                .await?;

            sqlx::migrate!("./migrations").run(&conn).await?;
            log::info!("Database migrations applied.");

            Repositories::postgres(conn)
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage, data will not survive a restart.");
            Repositories::in_memory()
        }
    };

    let application = services::start_services(repositories).await?;

    let listen = args.listen.unwrap_or(settings.server.listen);
    http::start_http_server(&listen, application).await
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    match log4rs::init_file(path, Default::default()) {
        Ok(_) => {
            println!("[*] Logging initialized successfully.");
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] Failed to initialize logging: {}", e);
            Err(anyhow!("Could not initialize logging: {}", e))
        }
    }
}
