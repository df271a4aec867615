pub mod model;
pub mod repository;

use log::{info, warn};
use std::path::Path;

use model::default_document;
use repository::{ContentRepository, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Written,
    AlreadyPresent,
}

/// Opens the content file at `path`, writing the default document when it is
/// absent. With `force` the default document replaces whatever is there.
pub async fn initialize_store(
    path: impl AsRef<Path>,
    force: bool,
) -> Result<(ContentRepository, SeedOutcome), StoreError> {
    let repository = ContentRepository::new(path.as_ref());
    info!("Using content file at {:?}", repository.path());

    if repository.exists().await && !force {
        warn!("Content file {:?} already exists, leaving it untouched.", repository.path());
        return Ok((repository, SeedOutcome::AlreadyPresent));
    }

    info!("Seeding default content.");
    repository.write(&default_document()).await?;
    info!("Default content written to {:?}.", repository.path());
    Ok((repository, SeedOutcome::Written))
}
