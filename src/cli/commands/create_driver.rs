use anyhow::{Result, bail};
use model::entities::driver;
use sea_orm::{ActiveModelTrait, Database, Set};
use tracing::{debug, info, trace};

use crate::auth::hash_password;

/// Create a driver account from the command line so a fresh deployment has
/// someone who can log in.
pub async fn create_driver(
    database_url: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    license_number: &str,
    password: &str,
) -> Result<()> {
    trace!("Entering create_driver function");

    if !model::license::is_valid(license_number) {
        bail!(
            "invalid license number '{}': must be 3 uppercase letters followed by 5 digits",
            license_number
        );
    }

    debug!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let password_hash = hash_password(password)?;

    let created = driver::ActiveModel {
        username: Set(username.to_string()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        password_hash: Set(password_hash),
        license_number: Set(license_number.to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    info!("Driver '{}' created with ID {}", created.username, created.id);
    println!("Created driver {} (id {})", created, created.id);

    Ok(())
}
