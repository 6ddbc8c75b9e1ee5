use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::{Role, User};

/// Request guard for protected routes: resolves the bearer token to a
/// live user record and attaches it to the handler.
pub struct CurrentUser(pub User);

/// Layered on top of authentication; admin-only routes.
pub struct AdminUser(pub User);

/// Bearer token from the Authorization header, falling back to the
/// `token` cookie.
pub(crate) fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
        {
            return Some(token.to_string());
        }
    }
    CookieJar::from_headers(headers)
        .get("token")
        .map(|c| c.value().to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            ApiError::Unauthenticated("You are not logged in! Please log in to get access.".into())
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthenticated("Invalid or expired token. Please log in again.".into())
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| {
                ApiError::Unauthenticated(
                    "The user belonging to this token no longer exists.".into(),
                )
            })?;

        if user.changed_password_after(claims.iat) {
            return Err(ApiError::Unauthenticated(
                "User recently changed password! Please log in again.".into(),
            ));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden(
                "You do not have permission to perform this action".into(),
            ));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), value.parse().unwrap());
        }
        map
    }

    #[test]
    fn extracts_bearer_token() {
        let map = headers(&[(AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn extracts_cookie_token() {
        let map = headers(&[(COOKIE, "token=cookie-token; other=1")]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn header_takes_priority_over_cookie() {
        let map = headers(&[
            (AUTHORIZATION, "Bearer from-header"),
            (COOKIE, "token=from-cookie"),
        ]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("from-header"));
    }

    #[test]
    fn malformed_scheme_falls_back_to_cookie() {
        let map = headers(&[(AUTHORIZATION, "Basic dXNlcg=="), (COOKIE, "token=fallback")]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("fallback"));
    }

    #[test]
    fn absent_token_is_none() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }
}
