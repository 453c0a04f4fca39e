//! Acting user extractor.
//!
//! Sessions are handled by the fronting web tier, which forwards the
//! authenticated user's id in the `X-User-Id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The user on whose behalf the request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid X-User-Id header".to_string()))?;

        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| ApiError::Unauthorized("X-User-Id must be a UUID".to_string()))?;

        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<ActingUser, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        ActingUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header() {
        let id = Uuid::new_v4();
        let user = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(user.user_id, id);
    }

    #[tokio::test]
    async fn test_missing_header() {
        assert!(matches!(extract(None).await, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_malformed_header() {
        assert!(matches!(
            extract(Some("not-a-uuid")).await,
            Err(ApiError::Unauthorized(_))
        ));
    }
}
