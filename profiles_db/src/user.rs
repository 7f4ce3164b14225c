use crate::DbResultExt;
use crate::GetDb;

use profiles_domain::error::{AppError, AppResult};
use profiles_domain::user::password::PasswordHash;
use profiles_domain::user::repo::*;
use profiles_domain::UserId;

use entrait::*;
use sqlx::error::ErrorKind;
use sqlx::SqliteConnection;

pub struct SqliteUserRepo;

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: uuid::Uuid,
    username: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: UserId(row.user_id),
            username: row.username,
            email: row.email,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl From<CredentialsRow> for (User, PasswordHash) {
    fn from(row: CredentialsRow) -> Self {
        (row.user.into(), row.password_hash.into())
    }
}

#[entrait]
impl profiles_domain::user::repo::UserRepoImpl for SqliteUserRepo {
    pub async fn insert_user(
        deps: &impl GetDb,
        username: &str,
        email: &str,
        password_hash: PasswordHash,
    ) -> AppResult<User> {
        let mut conn = deps.get_db().pool.acquire().await?;
        insert_user_row(&mut conn, username, email, &password_hash).await
    }

    pub async fn find_user_by_id(deps: &impl GetDb, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT user_id, username, email FROM auth_user WHERE user_id = ?"#,
        )
        .bind(user_id.0)
        .fetch_optional(&deps.get_db().pool)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn find_user_by_username(
        deps: &impl GetDb,
        username: &str,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT user_id, username, email FROM auth_user WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&deps.get_db().pool)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn find_user_credentials_by_id(
        deps: &impl GetDb,
        user_id: UserId,
    ) -> AppResult<Option<(User, PasswordHash)>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"SELECT user_id, username, email, password_hash FROM auth_user WHERE user_id = ?"#,
        )
        .bind(user_id.0)
        .fetch_optional(&deps.get_db().pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn find_user_credentials_by_username(
        deps: &impl GetDb,
        username: &str,
    ) -> AppResult<Option<(User, PasswordHash)>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"SELECT user_id, username, email, password_hash FROM auth_user WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&deps.get_db().pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn delete_user(deps: &impl GetDb, user_id: UserId) -> AppResult<()> {
        // The profile row is removed by `ON DELETE CASCADE`.
        let result = sqlx::query(r#"DELETE FROM auth_user WHERE user_id = ?"#)
            .bind(user_id.0)
            .execute(&deps.get_db().pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(AppError::UserNotFound)
        } else {
            Ok(())
        }
    }
}

pub(crate) async fn insert_user_row(
    conn: &mut SqliteConnection,
    username: &str,
    email: &str,
    password_hash: &PasswordHash,
) -> AppResult<User> {
    let user_id = UserId::new_random();

    sqlx::query(
        r#"INSERT INTO auth_user (user_id, username, email, password_hash) VALUES (?, ?, ?, ?)"#,
    )
    .bind(user_id.0)
    .bind(username)
    .bind(email)
    .bind(&password_hash.0)
    .execute(&mut *conn)
    .await
    .on_error_kind(ErrorKind::UniqueViolation, |_| AppError::UsernameTaken)?;

    Ok(User {
        user_id,
        username: username.to_string(),
        email: email.to_string(),
    })
}
