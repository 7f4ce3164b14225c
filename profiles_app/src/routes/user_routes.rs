use super::Route;
use profiles_domain::error::AppResult;
use profiles_domain::user::auth::Token;
use profiles_domain::user::{LoginUser, NewUser, SignedUser, UserApi};

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct UserBody<T> {
    user: T,
}

pub struct UserRoutes<D>(std::marker::PhantomData<D>);

impl<D> UserRoutes<D>
where
    D: UserApi + Sized + Clone + Send + Sync + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route(Route::Register.path(), post(Self::register))
            .route(Route::Login.path(), post(Self::login))
            .route(
                Route::CurrentUser.path(),
                get(Self::current_user).delete(Self::delete_current_user),
            )
    }

    async fn register(
        Extension(deps): Extension<D>,
        Json(body): Json<UserBody<NewUser>>,
    ) -> AppResult<Json<UserBody<SignedUser>>> {
        Ok(Json(UserBody {
            user: deps.register(body.user).await?,
        }))
    }

    async fn login(
        Extension(deps): Extension<D>,
        Json(body): Json<UserBody<LoginUser>>,
    ) -> AppResult<Json<UserBody<SignedUser>>> {
        Ok(Json(UserBody {
            user: deps.login(body.user).await?,
        }))
    }

    async fn current_user(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> AppResult<Json<UserBody<SignedUser>>> {
        Ok(Json(UserBody {
            user: deps.fetch_current(token).await?,
        }))
    }

    async fn delete_current_user(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> AppResult<StatusCode> {
        deps.delete_current(token).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
