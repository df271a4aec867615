use anyhow::Result;
use folio_db::{SeedOutcome, initialize_store};
use log::{error, info};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let content_file =
        env::var("CONTENT_FILE").unwrap_or_else(|_| "data/content.json".to_string());
    let force = env::args().skip(1).any(|arg| arg == "--force");

    info!("Starting Folio setup...");

    match initialize_store(&content_file, force).await {
        Ok((repository, SeedOutcome::Written)) => {
            info!("Default content seeded at {:?}.", repository.path());
            info!("Start the server with `folio-api` and sign in with ADMIN_USER / ADMIN_PASS.");
        }
        Ok((repository, SeedOutcome::AlreadyPresent)) => {
            info!(
                "Content already present at {:?}; pass --force to reset it.",
                repository.path()
            );
        }
        Err(e) => {
            error!("Failed to seed content: {e}");
            return Err(e.into());
        }
    }

    info!("Folio setup finished.");
    Ok(())
}
