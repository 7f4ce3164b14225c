//! Known accounts loaded into a fresh database.

use crate::error::AppResult;
use crate::profile::repo::{NewProfile, ProfileRepo};
use crate::user::password::{CleartextPassword, HashPassword};
use crate::user::repo::UserRepo;

use anyhow::Context;
use entrait::entrait_export as entrait;
use std::path::Path;

#[derive(Clone, serde::Deserialize)]
pub struct FixtureUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: CleartextPassword,
    #[serde(with = "crate::iso_date")]
    pub date_of_birth: time::Date,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Read a JSON array of users.
pub fn load_fixtures(path: &Path) -> anyhow::Result<Vec<FixtureUser>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixtures from {}", path.display()))?;

    serde_json::from_str(&json)
        .with_context(|| format!("failed to parse fixtures in {}", path.display()))
}

/// Create the users that do not exist yet. Returns how many were created.
#[entrait(pub SeedUsers, mock_api=SeedUsersMock)]
async fn seed_users(
    deps: &(impl HashPassword + UserRepo + ProfileRepo),
    fixtures: Vec<FixtureUser>,
) -> AppResult<usize> {
    let mut created = 0;

    for fixture in fixtures {
        if deps.find_user_by_username(&fixture.username).await?.is_some() {
            tracing::debug!(username = %fixture.username, "fixture user exists, skipping");
            continue;
        }

        let password_hash = deps.hash_password(fixture.password).await?;
        let profile = deps
            .insert_user_with_profile(
                &fixture.username,
                &fixture.email,
                password_hash,
                &NewProfile {
                    date_of_birth: fixture.date_of_birth,
                    phone_number: fixture.phone_number,
                    image: fixture.image,
                },
            )
            .await?;

        tracing::info!(user_id = %profile.user.user_id, username = %profile.user.username, "seeded user");
        created += 1;
    }

    Ok(created)
}
