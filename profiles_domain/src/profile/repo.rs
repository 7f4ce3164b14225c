use entrait::entrait_export as entrait;

use crate::error::AppResult;
use crate::user::password::PasswordHash;
use crate::user::repo::User;
use crate::UserId;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub i64);

/// The non-identity attributes of a user. Owned by exactly one user.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub profile_id: ProfileId,
    pub user: User,
    #[serde(with = "crate::iso_date")]
    pub date_of_birth: time::Date,
    pub phone_number: String,
    pub image: String,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user.username)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewProfile {
    pub date_of_birth: time::Date,
    pub phone_number: String,
    /// `None` stores [`DEFAULT_IMAGE`](super::DEFAULT_IMAGE).
    pub image: Option<String>,
}

/// `None` leaves the column untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// `None` leaves the column untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProfileChanges {
    pub image: Option<String>,
}

#[entrait(ProfileRepoImpl, delegate_by = DelegateProfileRepo, mock_api = ProfileRepoMock)]
pub trait ProfileRepo {
    /// Fails with `ProfileAlreadyExists` when the user has a profile,
    /// and with `UserNotFound` when the user does not exist.
    async fn insert_profile(&self, user_id: UserId, new_profile: &NewProfile)
        -> AppResult<Profile>;

    /// Insert a user and its profile in one transaction.
    async fn insert_user_with_profile(
        &self,
        username: &str,
        email: &str,
        password_hash: PasswordHash,
        new_profile: &NewProfile,
    ) -> AppResult<Profile>;

    async fn find_profile_by_user(&self, user_id: UserId) -> AppResult<Option<Profile>>;

    async fn list_profiles(&self) -> AppResult<Vec<Profile>>;

    /// Persist the profile's own fields. The embedded user is not written.
    async fn save_profile(&self, profile: &Profile) -> AppResult<()>;

    async fn delete_profile(&self, profile_id: ProfileId) -> AppResult<()>;

    /// Apply both change sets atomically: either both are committed or neither is.
    async fn update_account(
        &self,
        user_id: UserId,
        user_changes: &UserChanges,
        profile_changes: &ProfileChanges,
    ) -> AppResult<Profile>;
}
