use entrait::entrait_export as entrait;

use crate::error::AppResult;
use crate::user::password::PasswordHash;
use crate::UserId;

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

#[entrait(UserRepoImpl, delegate_by = DelegateUserRepo, mock_api = UserRepoMock)]
pub trait UserRepo {
    /// Fails with `UsernameTaken` when the username is in use.
    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: PasswordHash,
    ) -> AppResult<User>;

    async fn find_user_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_user_credentials_by_id(
        &self,
        user_id: UserId,
    ) -> AppResult<Option<(User, PasswordHash)>>;

    async fn find_user_credentials_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<(User, PasswordHash)>>;

    /// Deleting a user also deletes its profile.
    async fn delete_user(&self, user_id: UserId) -> AppResult<()>;
}
