use crate::error::{AppError, AppResult};

use anyhow::Context;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use entrait::entrait_export as entrait;

/// A password as typed by the user. Never logged, so no `Debug`.
#[derive(Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CleartextPassword(pub String);

impl<S: Into<String>> From<S> for CleartextPassword {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for CleartextPassword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The stored form of a password: an argon2id hash in PHC string format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PasswordHash(pub String);

impl<S: Into<String>> From<S> for PasswordHash {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn hash(password: &CleartextPassword) -> AppResult<PasswordHash> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let phc = Argon2::default()
        .hash_password(password.0.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to generate password hash: {e}"))?;

    Ok(PasswordHash(phc.to_string()))
}

fn verify(password: &CleartextPassword, password_hash: &PasswordHash) -> AppResult<()> {
    let phc = password_hash::PasswordHash::new(&password_hash.0)
        .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {e}"))?;

    Argon2::default()
        .verify_password(password.0.as_bytes(), &phc)
        .map_err(|e| match e {
            password_hash::Error::Password => AppError::Unauthorized,
            e => anyhow::anyhow!("failed to verify password hash: {e}").into(),
        })
}

/// Argon2 is slow on purpose. It runs on the blocking pool.
#[entrait(pub HashPassword, no_deps, mock_api=HashPasswordMock)]
async fn hash_password(password: CleartextPassword) -> AppResult<PasswordHash> {
    tokio::task::spawn_blocking(move || hash(&password))
        .await
        .context("password hashing task panicked")?
}

/// `Err(Unauthorized)` when the password does not match.
#[entrait(pub VerifyPassword, no_deps, mock_api=VerifyPasswordMock)]
async fn verify_password(password: CleartextPassword, password_hash: PasswordHash) -> AppResult<()> {
    tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .context("password verification task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::*;

    #[test]
    fn stored_hash_is_argon2id_and_hides_the_password() {
        let password_hash = hash(&"dannyPassword".into()).unwrap();

        assert!(password_hash.0.starts_with("$argon2id$"));
        assert!(!password_hash.0.contains("dannyPassword"));
    }

    #[test]
    fn only_the_exact_password_verifies() {
        let password_hash = hash(&"dannyPassword".into()).unwrap();

        assert!(verify(&"dannyPassword".into(), &password_hash).is_ok());
        for wrong in ["dannypassword", "dannyPassword ", ""] {
            assert_matches!(
                verify(&wrong.into(), &password_hash),
                Err(AppError::Unauthorized),
                "{wrong:?} should not verify"
            );
        }
    }

    #[test]
    fn unreadable_stored_hash_is_an_internal_error() {
        assert_matches!(
            verify(&"dannyPassword".into(), &"".into()),
            Err(AppError::Anyhow(_))
        );
        assert_matches!(
            verify(&"dannyPassword".into(), &"dannyPassword".into()),
            Err(AppError::Anyhow(_))
        );
    }

    #[tokio::test]
    async fn each_hash_gets_its_own_salt() {
        let deps = entrait::Impl::new(());
        let first = deps.hash_password("dannyPassword".into()).await.unwrap();
        let second = deps.hash_password("dannyPassword".into()).await.unwrap();

        assert_ne!(first, second);
        assert!(deps
            .verify_password("dannyPassword".into(), second)
            .await
            .is_ok());
    }
}
