use super::Route;
use profiles_domain::error::AppResult;
use profiles_domain::profile::form::{ProfileContext, ProfileSubmission};
use profiles_domain::profile::{ProfileUpdate, RenderProfilePage, SubmitProfileUpdate};
use profiles_domain::user::auth::Token;

use axum::extract::Extension;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json};

pub struct ProfileRoutes<D>(std::marker::PhantomData<D>);

impl<D> ProfileRoutes<D>
where
    D: RenderProfilePage + SubmitProfileUpdate + Sized + Clone + Send + Sync + 'static,
{
    pub fn router() -> axum::Router {
        axum::Router::new().route(
            Route::Profile.path(),
            get(Self::profile_page).post(Self::update_profile),
        )
    }

    async fn profile_page(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> AppResult<Json<ProfileContext>> {
        Ok(Json(deps.render_profile_page(token).await?))
    }

    /// `302 Found` back to the page once saved, otherwise the page again with its errors.
    async fn update_profile(
        Extension(deps): Extension<D>,
        token: Token,
        Form(submission): Form<ProfileSubmission>,
    ) -> AppResult<Response> {
        match deps.submit_profile_update(token, submission).await? {
            ProfileUpdate::Committed(_) => Ok(redirect(Route::Profile)),
            ProfileUpdate::Rejected(context) => Ok(Json(context).into_response()),
        }
    }
}

/// `302 Found` to the named route.
fn redirect(route: Route) -> Response {
    (StatusCode::FOUND, [(LOCATION, route.path())]).into_response()
}
