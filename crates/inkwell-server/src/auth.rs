//! Bearer-token auth middleware.
//!
//! Resolves `Authorization: Bearer <token>` (or `X-Api-Key`) against the
//! API token store and attaches the caller's capability set to the
//! request. Requests without a recognized token proceed as anonymous;
//! per-route capability checks reject them, not this middleware.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use inkwell_core::capabilities::CapabilitySet;
use inkwell_core::tokens::ApiTokenStore;

use crate::AppState;

/// Caller identity attached to request extensions by middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Whether a known token was presented.
    pub authenticated: bool,
    /// Capabilities granted to the caller.
    pub capabilities: CapabilitySet,
}

impl AuthenticatedUser {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            capabilities: CapabilitySet::new(),
        }
    }

    /// Whether the caller holds the named capability.
    pub fn can(&self, capability: &str) -> bool {
        self.capabilities.grants(capability)
    }
}

/// Extractor for routes that want the caller identity.
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}

/// Resolve a presented token to a caller identity.
///
/// Unknown or absent tokens yield the anonymous user with no capabilities.
pub fn resolve_user(store: &ApiTokenStore, token: Option<&str>) -> AuthenticatedUser {
    match token.and_then(|t| store.capabilities(t)) {
        Some(capabilities) => AuthenticatedUser {
            authenticated: true,
            capabilities: capabilities.clone(),
        },
        None => AuthenticatedUser::anonymous(),
    }
}

/// Middleware that attaches the caller identity to request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = token_from_headers(request.headers());
    let user = {
        let store = state.token_store.read().await;
        resolve_user(&store, token.as_deref())
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_core::capabilities::MANAGE_OPTIONS;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().expect("header value"));
        headers
    }

    #[test]
    fn extracts_bearer_and_api_key_tokens() {
        assert_eq!(
            token_from_headers(&headers_with("authorization", "Bearer abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            token_from_headers(&headers_with("x-api-key", "abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
        assert_eq!(
            token_from_headers(&headers_with("authorization", "Bearer ")),
            None
        );
    }

    #[test]
    fn known_tokens_resolve_to_their_capabilities() {
        let mut store = ApiTokenStore::default();
        store.insert("reader-token", [MANAGE_OPTIONS].into_iter().collect());

        let user = resolve_user(&store, Some("reader-token"));
        assert!(user.authenticated);
        assert!(user.can(MANAGE_OPTIONS));
    }

    #[test]
    fn unknown_and_absent_tokens_are_anonymous() {
        let store = ApiTokenStore::default();

        let user = resolve_user(&store, Some("who-dis"));
        assert!(!user.authenticated);
        assert!(user.capabilities.is_empty());

        let user = resolve_user(&store, None);
        assert!(!user.authenticated);
    }
}
