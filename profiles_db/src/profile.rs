use crate::user::insert_user_row;
use crate::DbResultExt;
use crate::GetDb;

use profiles_domain::error::{AppError, AppResult};
use profiles_domain::profile::repo::*;
use profiles_domain::profile::DEFAULT_IMAGE;
use profiles_domain::user::password::PasswordHash;
use profiles_domain::user::repo::User;
use profiles_domain::UserId;

use entrait::*;
use sqlx::error::ErrorKind;
use sqlx::SqliteConnection;

pub struct SqliteProfileRepo;

#[derive(sqlx::FromRow)]
struct ProfileRow {
    profile_id: i64,
    date_of_birth: time::Date,
    phone_number: String,
    image: String,
    user_id: uuid::Uuid,
    username: String,
    email: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            profile_id: ProfileId(row.profile_id),
            user: User {
                user_id: UserId(row.user_id),
                username: row.username,
                email: row.email,
            },
            date_of_birth: row.date_of_birth,
            phone_number: row.phone_number,
            image: row.image,
        }
    }
}

const SELECT_PROFILE: &str = r#"
    SELECT
        profile.profile_id,
        profile.date_of_birth,
        profile.phone_number,
        profile.image,
        auth_user.user_id,
        auth_user.username,
        auth_user.email
    FROM profile
    JOIN auth_user ON auth_user.user_id = profile.user_id
"#;

#[entrait]
impl profiles_domain::profile::repo::ProfileRepoImpl for SqliteProfileRepo {
    pub async fn insert_profile(
        deps: &impl GetDb,
        user_id: UserId,
        new_profile: &NewProfile,
    ) -> AppResult<Profile> {
        let mut tx = deps.get_db().pool.begin().await?;

        let profile_id = insert_profile_row(&mut tx, user_id, new_profile).await?;
        let profile = fetch_profile_by_id(&mut tx, profile_id)
            .await?
            .ok_or(AppError::ProfileNotFound)?;

        tx.commit().await?;
        Ok(profile)
    }

    pub async fn insert_user_with_profile(
        deps: &impl GetDb,
        username: &str,
        email: &str,
        password_hash: PasswordHash,
        new_profile: &NewProfile,
    ) -> AppResult<Profile> {
        let mut tx = deps.get_db().pool.begin().await?;

        let user = insert_user_row(&mut tx, username, email, &password_hash).await?;
        let profile_id = insert_profile_row(&mut tx, user.user_id, new_profile).await?;
        let profile = fetch_profile_by_id(&mut tx, profile_id)
            .await?
            .ok_or(AppError::ProfileNotFound)?;

        tx.commit().await?;
        Ok(profile)
    }

    pub async fn find_profile_by_user(
        deps: &impl GetDb,
        user_id: UserId,
    ) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "{SELECT_PROFILE} WHERE profile.user_id = ?"
        ))
        .bind(user_id.0)
        .fetch_optional(&deps.get_db().pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    pub async fn list_profiles(deps: &impl GetDb) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "{SELECT_PROFILE} ORDER BY profile.profile_id"
        ))
        .fetch_all(&deps.get_db().pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    pub async fn save_profile(deps: &impl GetDb, profile: &Profile) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE profile SET
                date_of_birth = ?,
                phone_number = ?,
                image = ?
            WHERE profile_id = ?
            "#,
        )
        .bind(profile.date_of_birth)
        .bind(&profile.phone_number)
        .bind(&profile.image)
        .bind(profile.profile_id.0)
        .execute(&deps.get_db().pool)
        .await?;

        if result.rows_affected() == 0 {
            Err(AppError::ProfileNotFound)
        } else {
            Ok(())
        }
    }

    pub async fn delete_profile(deps: &impl GetDb, profile_id: ProfileId) -> AppResult<()> {
        let result = sqlx::query(r#"DELETE FROM profile WHERE profile_id = ?"#)
            .bind(profile_id.0)
            .execute(&deps.get_db().pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(AppError::ProfileNotFound)
        } else {
            Ok(())
        }
    }

    pub async fn update_account(
        deps: &impl GetDb,
        user_id: UserId,
        user_changes: &UserChanges,
        profile_changes: &ProfileChanges,
    ) -> AppResult<Profile> {
        let mut tx = deps.get_db().pool.begin().await?;

        let user_result = sqlx::query(
            r#"
            UPDATE auth_user SET
                username = COALESCE(?, username),
                email = COALESCE(?, email)
            WHERE user_id = ?
            "#,
        )
        .bind(user_changes.username.as_deref())
        .bind(user_changes.email.as_deref())
        .bind(user_id.0)
        .execute(&mut *tx)
        .await
        .on_error_kind(ErrorKind::UniqueViolation, |_| AppError::UsernameTaken)?;

        if user_result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }

        let profile_result = sqlx::query(
            r#"UPDATE profile SET image = COALESCE(?, image) WHERE user_id = ?"#,
        )
        .bind(profile_changes.image.as_deref())
        .bind(user_id.0)
        .execute(&mut *tx)
        .await?;

        // Dropping the transaction rolls back the user update.
        if profile_result.rows_affected() == 0 {
            return Err(AppError::ProfileNotFound);
        }

        let profile = sqlx::query_as::<_, ProfileRow>(&format!(
            "{SELECT_PROFILE} WHERE profile.user_id = ?"
        ))
        .bind(user_id.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(profile.into())
    }
}

async fn insert_profile_row(
    conn: &mut SqliteConnection,
    user_id: UserId,
    new_profile: &NewProfile,
) -> AppResult<ProfileId> {
    let result = sqlx::query(
        r#"
        INSERT INTO profile (user_id, date_of_birth, phone_number, image)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id.0)
    .bind(new_profile.date_of_birth)
    .bind(&new_profile.phone_number)
    .bind(new_profile.image.as_deref().unwrap_or(DEFAULT_IMAGE))
    .execute(&mut *conn)
    .await
    .on_error_kind(ErrorKind::UniqueViolation, |_| AppError::ProfileAlreadyExists)
    .on_error_kind(ErrorKind::ForeignKeyViolation, |_| AppError::UserNotFound)?;

    Ok(ProfileId(result.last_insert_rowid()))
}

async fn fetch_profile_by_id(
    conn: &mut SqliteConnection,
    profile_id: ProfileId,
) -> AppResult<Option<Profile>> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        "{SELECT_PROFILE} WHERE profile.profile_id = ?"
    ))
    .bind(profile_id.0)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Profile::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_test_db;
    use crate::user::tests::{insert_test_user, TestNewUser};

    use profiles_domain::fixture::{load_fixtures, SeedUsers};
    use profiles_domain::user::repo::UserRepo;
    use profiles_domain::user::CheckPassword;

    use assert_matches::*;
    use std::path::Path;

    fn new_profile() -> NewProfile {
        NewProfile {
            date_of_birth: time::macros::date!(2000 - 01 - 01),
            phone_number: "1234567890".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn should_create_then_fetch_profile() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;

        let created = db.insert_profile(user.user_id, &new_profile()).await?;
        assert_eq!(user, created.user);
        assert_eq!(time::macros::date!(2000 - 01 - 01), created.date_of_birth);
        assert_eq!("1234567890", created.phone_number);

        let fetched = db.find_profile_by_user(user.user_id).await?.unwrap();
        assert_eq!(created, fetched);
        Ok(())
    }

    #[tokio::test]
    async fn profile_without_image_gets_the_default() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;

        let profile = db.insert_profile(user.user_id, &new_profile()).await?;

        assert_eq!("default.jpg", profile.image);
        Ok(())
    }

    #[tokio::test]
    async fn profile_displays_as_its_username() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;

        let profile = db.insert_profile(user.user_id, &new_profile()).await?;

        assert_eq!("testuser", profile.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn should_fail_to_create_a_second_profile_for_a_user() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;
        db.insert_profile(user.user_id, &new_profile()).await?;

        assert_matches!(
            db.insert_profile(user.user_id, &new_profile()).await,
            Err(AppError::ProfileAlreadyExists)
        );
        Ok(())
    }

    #[tokio::test]
    async fn should_fail_to_create_a_profile_for_a_missing_user() {
        let db = create_test_db().await;

        assert_matches!(
            db.insert_profile(UserId::new_random(), &new_profile()).await,
            Err(AppError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn saved_changes_should_be_durable() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;
        let mut profile = db.insert_profile(user.user_id, &new_profile()).await?;

        profile.phone_number = "0987654321".to_string();
        profile.date_of_birth = time::macros::date!(1999 - 12 - 31);
        db.save_profile(&profile).await?;

        let fetched = db.find_profile_by_user(user.user_id).await?.unwrap();
        assert_eq!("0987654321", fetched.phone_number);
        assert_eq!(time::macros::date!(1999 - 12 - 31), fetched.date_of_birth);
        Ok(())
    }

    #[tokio::test]
    async fn deleted_profile_should_disappear_from_the_list() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;
        let profile = db.insert_profile(user.user_id, &new_profile()).await?;
        assert_eq!(vec![profile.clone()], db.list_profiles().await?);

        db.delete_profile(profile.profile_id).await?;

        assert_eq!(Vec::<Profile>::new(), db.list_profiles().await?);
        // The user outlives its profile.
        assert!(db.find_user_by_id(user.user_id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn deleting_the_user_should_delete_the_profile() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;
        db.insert_profile(user.user_id, &new_profile()).await?;

        db.delete_user(user.user_id).await?;

        assert_eq!(None, db.find_profile_by_user(user.user_id).await?);
        assert!(db.list_profiles().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_account_should_change_only_given_fields() -> AppResult<()> {
        let db = create_test_db().await;
        let user = insert_test_user(&db, TestNewUser::default()).await?;
        db.insert_profile(user.user_id, &new_profile()).await?;

        let updated = db
            .update_account(
                user.user_id,
                &UserChanges {
                    email: Some("newemail@example.com".to_string()),
                    ..Default::default()
                },
                &ProfileChanges {
                    image: Some("profile_pics/me.png".to_string()),
                },
            )
            .await?;

        assert_eq!("testuser", updated.user.username);
        assert_eq!("newemail@example.com", updated.user.email);
        assert_eq!("profile_pics/me.png", updated.image);
        assert_eq!("1234567890", updated.phone_number);
        Ok(())
    }

    #[tokio::test]
    async fn update_account_should_be_all_or_nothing() -> AppResult<()> {
        let db = create_test_db().await;
        // A user without a profile: the second half of the update fails.
        let user = insert_test_user(&db, TestNewUser::default()).await?;

        assert_matches!(
            db.update_account(
                user.user_id,
                &UserChanges {
                    username: Some("newusername".to_string()),
                    ..Default::default()
                },
                &ProfileChanges::default(),
            )
            .await,
            Err(AppError::ProfileNotFound)
        );

        assert_eq!(
            "testuser",
            db.find_user_by_id(user.user_id).await?.unwrap().username
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_account_to_taken_username_should_fail() -> AppResult<()> {
        let db = create_test_db().await;
        insert_test_user(&db, TestNewUser::default()).await?;
        let profile = db
            .insert_user_with_profile("otheruser", "", "hash".into(), &new_profile())
            .await?;

        assert_matches!(
            db.update_account(
                profile.user.user_id,
                &UserChanges {
                    username: Some("testuser".to_string()),
                    ..Default::default()
                },
                &ProfileChanges::default(),
            )
            .await,
            Err(AppError::UsernameTaken)
        );
        Ok(())
    }

    #[tokio::test]
    async fn seeded_user_should_accept_its_password() -> AppResult<()> {
        let db = create_test_db().await;
        let fixtures = load_fixtures(
            &Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures/users.json"),
        )?;

        assert_eq!(1, db.seed_users(fixtures.clone()).await?);
        // Seeding twice is a no-op.
        assert_eq!(0, db.seed_users(fixtures).await?);

        let danny = db.find_user_by_username("Danny").await?.unwrap();
        assert!(db.check_password(danny.user_id, "dannyPassword".into()).await?);
        assert!(!db.check_password(danny.user_id, "wrong".into()).await?);

        let profile = db.find_profile_by_user(danny.user_id).await?.unwrap();
        assert_eq!(danny, profile.user);
        assert_eq!("Danny", profile.to_string());
        assert_eq!("default.jpg", profile.image);
        Ok(())
    }
}
