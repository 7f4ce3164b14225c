pub mod form;
pub mod repo;

use form::{ProfileContext, ProfileSubmission, USERNAME_TAKEN};
use repo::{Profile, ProfileRepo};

use crate::error::{AppError, AppResult};
use crate::user::auth::{Authenticate, Token};
use crate::user::repo::UserRepo;
use crate::UserId;

use entrait::entrait_export as entrait;

/// Image of a profile created without one.
pub const DEFAULT_IMAGE: &str = "default.jpg";

/// Outcome of submitting the profile page.
#[derive(Clone, Debug)]
pub enum ProfileUpdate {
    /// Both forms validated and were saved.
    Committed(Profile),
    /// Nothing was saved; the forms carry the errors.
    Rejected(ProfileContext),
}

#[entrait(pub RenderProfilePage, mock_api=RenderProfilePageMock)]
async fn render_profile_page(
    deps: &(impl Authenticate + ProfileRepo),
    token: Token,
) -> AppResult<ProfileContext> {
    let current_user_id = deps.authenticate(token)?;
    let profile = fetch_own_profile(deps, current_user_id).await?;

    Ok(ProfileContext::new(&profile))
}

#[entrait(pub SubmitProfileUpdate, mock_api=SubmitProfileUpdateMock)]
async fn submit_profile_update(
    deps: &(impl Authenticate + UserRepo + ProfileRepo),
    token: Token,
    submission: ProfileSubmission,
) -> AppResult<ProfileUpdate> {
    let current_user_id = deps.authenticate(token)?;
    let profile = fetch_own_profile(deps, current_user_id).await?;

    let mut context = ProfileContext::bind(&profile, &submission);
    let user_form_valid = context.u_form.is_valid();
    let profile_form_valid = context.p_form.is_valid();

    if user_form_valid {
        let new_username = context
            .u_form
            .changes()
            .and_then(|changes| changes.username.clone())
            .filter(|username| username != &profile.user.username);

        if let Some(username) = new_username {
            if let Some(other) = deps.find_user_by_username(&username).await? {
                if other.user_id != current_user_id {
                    context.u_form.errors.add("username", USERNAME_TAKEN);
                }
            }
        }
    }

    if !(user_form_valid && profile_form_valid) || !context.u_form.errors.is_empty() {
        return Ok(ProfileUpdate::Rejected(context));
    }

    let user_changes = context.u_form.changes().cloned().unwrap_or_default();
    let profile_changes = context.p_form.changes().cloned().unwrap_or_default();

    match deps
        .update_account(current_user_id, &user_changes, &profile_changes)
        .await
    {
        Ok(profile) => {
            tracing::info!(user_id = %current_user_id, "profile updated");
            Ok(ProfileUpdate::Committed(profile))
        }
        // Lost a race against another account claiming the same username.
        Err(AppError::UsernameTaken) => {
            context.u_form.errors.add("username", USERNAME_TAKEN);
            Ok(ProfileUpdate::Rejected(context))
        }
        Err(e) => Err(e),
    }
}

async fn fetch_own_profile(deps: &impl ProfileRepo, user_id: UserId) -> AppResult<Profile> {
    deps.find_profile_by_user(user_id)
        .await?
        .ok_or(AppError::ProfileNotFound)
}
