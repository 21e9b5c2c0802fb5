// ABOUTME: Identification of the acting user for API requests
// ABOUTME: Reads the X-User-Id header; role checks happen in the workflow layer

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user performing the request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        Ok(Self { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CurrentUser, ApiError> {
        let (mut parts, _) = request.into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_header() {
        let request = Request::builder()
            .header("X-User-Id", " usr-123 ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().id, "usr-123");
    }

    #[tokio::test]
    async fn test_missing_or_blank_header_is_unauthenticated() {
        let missing = Request::builder().body(()).unwrap();
        assert!(matches!(extract(missing).await, Err(ApiError::Unauthenticated)));

        let blank = Request::builder().header("X-User-Id", "  ").body(()).unwrap();
        assert!(matches!(extract(blank).await, Err(ApiError::Unauthenticated)));
    }
}
