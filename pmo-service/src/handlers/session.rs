//! Session extraction for protected routes

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::{
    auth::SessionClaims,
    error::{Error, Result},
    state::AppState,
};

/// Claims of the caller's validated session token
///
/// The token is read from the session cookie set at login, falling back to
/// an `Authorization: Bearer` header. Rejects with [`Error::Unauthorized`].
#[derive(Debug, Clone)]
pub struct Session(pub SessionClaims);

impl Session {
    /// Require `role`, failing with [`Error::Forbidden`]
    pub fn require_role(&self, role: &str) -> Result<&SessionClaims> {
        if self.0.has_role(role) {
            return Ok(&self.0);
        }
        tracing::debug!(subject = %self.0.sub, required = role, "Session lacks required role");
        Err(Error::Forbidden(format!("Requires the '{}' role", role)))
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = extract_token(&parts.headers, &state.config().tokens.cookie_name)?;
        let claims = state.issuer().validate(&token)?;
        Ok(Self(claims))
    }
}

/// Pull the session token out of the cookie or the bearer header
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Result<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string());
    if let Some(token) = from_cookie {
        return Ok(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or_else(|| Error::Unauthorized("Missing session token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; JwtToken=abc.def.ghi; lang=en"),
        );
        assert_eq!(extract_token(&headers, "JwtToken").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("JwtToken=cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(extract_token(&headers, "JwtToken").unwrap(), "cookie");
    }

    #[test]
    fn test_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("JwtToken="));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_token(&headers, "JwtToken").unwrap(), "xyz");
    }

    #[test]
    fn test_missing_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(matches!(
            extract_token(&headers, "JwtToken"),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_require_role() {
        let session = Session(SessionClaims {
            sub: "employee:1".to_string(),
            username: "boss".to_string(),
            roles: vec!["Supervisor".to_string()],
            exp: 0,
            iat: 0,
            jti: "jti".to_string(),
            iss: None,
            aud: None,
        });
        assert!(session.require_role("supervisor").is_ok());
        assert!(matches!(
            session.require_role("admin"),
            Err(Error::Forbidden(_))
        ));
    }
}
