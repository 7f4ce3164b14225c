use crate::error::{AppError, AppResult};
use crate::{GetConfig, System, UserId};

use axum_extra::TypedHeader;
use entrait::entrait_export as entrait;
use headers::authorization::Credentials;
use headers::Authorization;
use http::HeaderValue;
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use uuid::Uuid;

const DEFAULT_SESSION_LENGTH: time::Duration = time::Duration::weeks(2);

#[derive(serde::Serialize, serde::Deserialize)]
struct AuthUserClaims {
    user_id: Uuid,
    /// Standard JWT `exp` claim.
    exp: i64,
}

#[entrait(pub SignUserId, mock_api=SignUserIdMock)]
fn sign_user_id(deps: &(impl System + GetConfig), user_id: UserId) -> String {
    AuthUserClaims {
        user_id: user_id.0,
        exp: (deps.get_current_time() + DEFAULT_SESSION_LENGTH).unix_timestamp(),
    }
    .sign_with_key(deps.get_jwt_signing_key())
    .expect("HMAC signing should be infallible")
}

/// Resolve the user a token was issued to.
///
/// Fails with `Unauthorized` for anything but an untampered, unexpired token.
#[entrait(pub Authenticate, mock_api=AuthenticateMock)]
fn authenticate(deps: &(impl System + GetConfig), token: Token) -> AppResult<UserId> {
    let jwt = jwt::Token::<jwt::Header, AuthUserClaims, _>::parse_unverified(token.token())
        .map_err(|_| AppError::Unauthorized)?;

    let jwt = jwt
        .verify_with_key(deps.get_jwt_signing_key())
        .map_err(|_| AppError::Unauthorized)?;
    let (_header, claims) = jwt.into();

    if claims.exp < deps.get_current_time().unix_timestamp() {
        tracing::debug!(user_id = %claims.user_id, "rejecting expired token");
        return Err(AppError::Unauthorized);
    }

    Ok(UserId(claims.user_id))
}

///
/// Data for `Token` authorization scheme.
///
#[derive(Clone, Debug)]
pub struct Token(String);

impl Token {
    pub fn from_token(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("{} {}", Self::SCHEME, self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.token()
    }
}

impl Credentials for Token {
    const SCHEME: &'static str = "Token";

    fn decode(value: &HeaderValue) -> Option<Self> {
        let auth_header = value.to_str().ok()?;
        let token = auth_header.get(Self::SCHEME.len()..)?.trim_start();

        if token.is_empty() {
            return None;
        }

        Some(Token(token.to_string()))
    }

    fn encode(&self) -> HeaderValue {
        HeaderValue::from_str(&self.header_value()).expect("token is a valid header value")
    }
}

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for Token
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(token)) =
            TypedHeader::<Authorization<Token>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestSystem;

    use assert_matches::*;

    fn test_user_id() -> UserId {
        UserId(uuid::Uuid::parse_str("20a626ba-c7d3-44c7-981a-e880f81c126f").unwrap())
    }

    #[test]
    fn should_sign_and_authenticate_token() {
        let deps = TestSystem::default();
        let token = sign_user_id(&deps, test_user_id());

        assert_eq!(3, token.split('.').count());

        let result_user_id = authenticate(&deps, Token::from_token(&token)).unwrap();

        assert_eq!(test_user_id(), result_user_id);
    }

    #[test]
    fn should_reject_expired_token() {
        let mut deps = TestSystem::default();
        let token = sign_user_id(&deps, test_user_id());

        deps.now = deps.now + DEFAULT_SESSION_LENGTH + time::Duration::seconds(1);

        assert_matches!(
            authenticate(&deps, Token::from_token(&token)),
            Err(AppError::Unauthorized)
        );
    }

    #[test]
    fn should_reject_token_signed_with_other_key() {
        use hmac::Mac;

        let other = TestSystem {
            jwt_signing_key: hmac::Hmac::<sha2::Sha384>::new_from_slice(b"other key").unwrap(),
            ..TestSystem::default()
        };
        let token = sign_user_id(&other, test_user_id());

        assert_matches!(
            authenticate(&TestSystem::default(), Token::from_token(&token)),
            Err(AppError::Unauthorized)
        );
        assert_matches!(
            authenticate(&TestSystem::default(), Token::from_token("garbage")),
            Err(AppError::Unauthorized)
        );
    }

    #[test]
    fn should_decode_authorization_header() {
        let token = Token::decode(&HeaderValue::from_static("Token abc.def.ghi")).unwrap();
        assert_eq!("abc.def.ghi", token.token());
        assert_eq!("Token abc.def.ghi", token.encode().to_str().unwrap());

        assert!(Token::decode(&HeaderValue::from_static("Token ")).is_none());
    }
}
