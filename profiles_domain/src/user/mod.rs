pub mod auth;
pub mod password;
pub mod repo;

use auth::{Authenticate, SignUserId, Token};
use password::{CleartextPassword, HashPassword, VerifyPassword};
use repo::UserRepo;

use crate::error::{AppError, AppResult};
use crate::form::AccountFields;
use crate::profile::repo::{NewProfile, ProfileRepo};
use crate::UserId;

use entrait::entrait_export as entrait;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct SignedUser {
    pub username: String,
    pub email: String,
    pub token: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginUser {
    pub username: String,
    pub password: CleartextPassword,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: CleartextPassword,
    #[serde(with = "crate::iso_date")]
    pub date_of_birth: time::Date,
    #[serde(default)]
    pub phone_number: String,
}

impl NewUser {
    fn validate(&self) -> AppResult<()> {
        AccountFields {
            username: Some(self.username.clone()),
            email: Some(self.email.clone()).filter(|email| !email.is_empty()),
            password: Some(self.password.as_ref().to_string()),
        }
        .check()
        .into_result()
    }
}

#[entrait(pub UserApi, mock_api=UserApiMock)]
pub mod api {
    use super::*;

    /// Create a user together with its profile.
    pub async fn register(
        deps: &(impl HashPassword + ProfileRepo + SignUserId),
        new_user: NewUser,
    ) -> AppResult<SignedUser> {
        new_user.validate()?;

        let password_hash = deps.hash_password(new_user.password).await?;
        let profile = deps
            .insert_user_with_profile(
                &new_user.username,
                &new_user.email,
                password_hash,
                &NewProfile {
                    date_of_birth: new_user.date_of_birth,
                    phone_number: new_user.phone_number,
                    image: None,
                },
            )
            .await?;

        tracing::info!(user_id = %profile.user.user_id, "registered user");

        Ok(sign(deps, profile.user))
    }

    pub async fn login(
        deps: &(impl UserRepo + VerifyPassword + SignUserId),
        login_user: LoginUser,
    ) -> AppResult<SignedUser> {
        let (user, password_hash) = deps
            .find_user_credentials_by_username(&login_user.username)
            .await?
            .ok_or(AppError::UsernameDoesNotExist)?;

        deps.verify_password(login_user.password, password_hash)
            .await?;

        Ok(sign(deps, user))
    }

    pub async fn fetch_current(
        deps: &(impl Authenticate + UserRepo + SignUserId),
        token: Token,
    ) -> AppResult<SignedUser> {
        let current_user_id = deps.authenticate(token)?;
        let user = deps
            .find_user_by_id(current_user_id)
            .await?
            .ok_or(AppError::CurrentUserDoesNotExist)?;

        Ok(sign(deps, user))
    }

    /// Delete the authenticated user. Its profile goes with it.
    pub async fn delete_current(
        deps: &(impl Authenticate + UserRepo),
        token: Token,
    ) -> AppResult<()> {
        let current_user_id = deps.authenticate(token)?;
        deps.delete_user(current_user_id).await?;

        tracing::info!(user_id = %current_user_id, "deleted user");
        Ok(())
    }

    fn sign(deps: &impl SignUserId, user: repo::User) -> SignedUser {
        SignedUser {
            token: deps.sign_user_id(user.user_id),
            username: user.username,
            email: user.email,
        }
    }
}

/// One-way password check against the stored hash. `Ok(false)` on mismatch.
#[entrait(pub CheckPassword, mock_api=CheckPasswordMock)]
async fn check_password(
    deps: &(impl UserRepo + VerifyPassword),
    user_id: UserId,
    password: CleartextPassword,
) -> AppResult<bool> {
    let (_, password_hash) = deps
        .find_user_credentials_by_id(user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    match deps.verify_password(password, password_hash).await {
        Ok(()) => Ok(true),
        Err(AppError::Unauthorized) => Ok(false),
        Err(e) => Err(e),
    }
}
