//! Page/limit pagination extractor

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use peiplay_service::dto::PageParams;
use serde::Deserialize;

use crate::response::ApiError;

#[derive(Debug, Default, Deserialize)]
struct RawPage {
    page: Option<i64>,
    limit: Option<i64>,
}

/// `?page=&limit=`, clamped into a usable [`PageParams`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination(pub PageParams);

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPage>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.body_text()))?;
        Ok(Pagination(PageParams::new(raw.page, raw.limit)))
    }
}

/// Query-string extractor that reports failures in the API error shape
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.body_text()))?;
        Ok(QueryParams(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use peiplay_service::dto::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    async fn extract(uri: &str) -> Pagination {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        Pagination::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let Pagination(page) = extract("/bookings").await;
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_limit_clamped() {
        let Pagination(page) = extract("/bookings?page=3&limit=1000").await;
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 2 * MAX_PAGE_SIZE);
    }
}
