use anyhow::{Context, Result};

use super::{OutputFormat, SuccessResponse};
use crate::config::EngineSettings;
use crate::db::{BusinessSeed, Database};

/// Load a business definition file into a local database
pub fn run_seed(db_path: &str, file: &str, format: OutputFormat) -> Result<()> {
    let seed = BusinessSeed::from_file(file)?;

    let settings = EngineSettings::from_env();
    let db = Database::open(db_path, settings.store_timeout())
        .with_context(|| format!("Failed to open database {}", db_path))?;
    db.apply_seed(&seed)
        .with_context(|| format!("Failed to load business {}", seed.id))?;

    tracing::info!(business = %seed.id, db = db_path, "seeded business");

    let response = SuccessResponse {
        message: format!(
            "Loaded business {} ({}): {} services, {} staff, {} resource types, {} customers",
            seed.id,
            seed.allocation_mode,
            seed.services.len(),
            seed.staff.len(),
            seed.resource_types.len(),
            seed.customers.len()
        ),
    };
    format.print(&response);
    Ok(())
}
