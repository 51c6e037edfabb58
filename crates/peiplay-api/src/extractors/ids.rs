//! Snowflake path parameters

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use peiplay_core::Snowflake;

use crate::response::ApiError;

/// A single `:id`-style path segment parsed as a snowflake
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub Snowflake);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Snowflake>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.body_text()))?;
        Ok(IdPath(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/bookings/:booking_id",
            get(|IdPath(id): IdPath| async move { id.to_string() }),
        )
    }

    async fn status_for(uri: &str) -> StatusCode {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_numeric_id_accepted() {
        assert_eq!(status_for("/bookings/123456789").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_garbage_id_rejected() {
        assert_eq!(status_for("/bookings/abc").await, StatusCode::BAD_REQUEST);
    }
}
