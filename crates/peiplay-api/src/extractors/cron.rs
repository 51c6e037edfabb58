//! Cron bearer-secret guard

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use peiplay_service::services::authorize_cron;

use crate::response::ApiError;
use crate::state::AppState;

/// Marker proving the request may trigger a sweep
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

#[async_trait]
impl<S> FromRequestParts<S> for CronAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();
        let presented = bearer.as_ref().map(|TypedHeader(Authorization(b))| b.token());

        authorize_cron(
            &app_state.config().cron,
            app_state.config().app.env,
            presented,
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "Cron request refused");
            ApiError::App(e)
        })?;
        Ok(CronAuth)
    }
}
