use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use db::models::user::User;

use crate::{AppState, error::ApiError};

/// Resolved identity of the request, stashed as an extension by
/// [`require_auth`].
#[derive(Clone)]
pub struct CurrentUser(pub User);

pub fn parse_authorization_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Verifies the bearer token and loads the user it was issued for. Everything
/// behind this layer can rely on the `CurrentUser` extension being present.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = parse_authorization_bearer(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;
    let user_id = state.auth.verify_token(token)?;
    let user = User::find_by_id(&state.db.conn, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

pub fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin access required".to_string()))
    }
}

pub fn require_caller(user: &User) -> Result<(), ApiError> {
    if user.role.is_caller() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Caller access required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn parses_bearer_tokens() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(parse_authorization_bearer(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn scheme_matches_case_insensitively() {
        for value in ["bearer abc", "BEARER abc", "BeArEr abc"] {
            let mut headers = HeaderMap::new();
            headers.insert(
                axum::http::header::AUTHORIZATION,
                HeaderValue::from_str(value).unwrap(),
            );
            assert_eq!(parse_authorization_bearer(&headers), Some("abc"), "{value}");
        }
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        let headers = HeaderMap::new();
        assert_eq!(parse_authorization_bearer(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Token abc"),
        );
        assert_eq!(parse_authorization_bearer(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer "),
        );
        assert_eq!(parse_authorization_bearer(&headers), None);
    }
}
