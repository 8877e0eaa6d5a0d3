//! Bearer authentication and tenant context extraction
//!
//! [`RequestContext`] decodes the identity token and resolves the
//! [`TenantContext`] once per request; the result is cached in the request
//! extensions so later extractors reuse it.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::error::{AppError, Result};
use crate::state::HasServices;
use crate::tenant::TenantContext;

/// Resolved tenant context of the current request
#[derive(Debug, Clone)]
pub struct RequestContext(pub TenantContext);

impl std::ops::Deref for RequestContext {
    type Target = TenantContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extract the Bearer token from the Authorization header
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Result<&str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthenticationRequired("Missing authorization token".to_string()))?
        .to_str()
        .map_err(|_| {
            AppError::AuthenticationRequired("Invalid authorization header".to_string())
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::AuthenticationRequired(
                "Authorization header must use Bearer scheme".to_string(),
            )
        })
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: HasServices + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        if let Some(ctx) = parts.extensions.get::<TenantContext>() {
            return Ok(RequestContext(ctx.clone()));
        }

        let token = extract_bearer_token(&parts.headers)?;
        let claims = state.jwt_manager().verify_identity_token(token)?;
        let ctx = TenantContext::resolve(claims.identity()?)?;

        parts.extensions.insert(ctx.clone());
        Ok(RequestContext(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AppError::AuthenticationRequired(_))
        ));
    }

    #[test]
    fn test_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_err());
    }
}
