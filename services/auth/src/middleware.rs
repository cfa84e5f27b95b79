//! Middleware for session token validation and authentication
//!
//! The token is read from the `token` cookie first and from an
//! `Authorization: Bearer` header second. A validated [`Identity`] is
//! inserted into the request extensions; handlers take it back out with
//! `Extension<Identity>` on mandatory routes or `Option<Extension<Identity>>`
//! on routes guarded by [`optional_auth`].

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{
    error::AuthError,
    jwt::{Identity, JwtService},
};

/// Name of the session cookie
pub const TOKEN_COOKIE: &str = "token";

/// Extract the raw session token from cookies or the Authorization header
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| {
            // The scheme is case-insensitive
            if value.len() > 7 && value[..7].eq_ignore_ascii_case("bearer ") {
                Some(value[7..].trim().to_string())
            } else {
                None
            }
        })
        .filter(|token| !token.is_empty())
}

/// Resolve the identity behind a request, if any
pub fn authenticate(jwt: &JwtService, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let token = extract_token(headers).ok_or(AuthError::MissingToken)?;
    jwt.validate(&token)
}

/// Reject the request unless it carries a valid session token
pub async fn require_auth(
    State(jwt): State<JwtService>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticate(&jwt, req.headers())?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Attach the identity when a valid token is present, continue anonymously otherwise
pub async fn optional_auth(
    State(jwt): State<JwtService>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&jwt, req.headers()) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
        }
        Err(e) => debug!("Continuing without identity: {}", e),
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtConfig;
    use axum::{
        Extension, Router,
        body::{Body, to_bytes},
        http::{Request as HttpRequest, StatusCode, header::COOKIE},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn jwt() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "middleware_secret".to_string(),
            token_expiry: 3600,
        })
    }

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "bob@example.com".to_string(),
            username: "bob".to_string(),
            full_name: "Bob Builder".to_string(),
        }
    }

    fn app(jwt: JwtService) -> Router {
        let mandatory = Router::new()
            .route(
                "/mandatory",
                get(|Extension(identity): Extension<Identity>| async move { identity.username }),
            )
            .route_layer(middleware::from_fn_with_state(jwt.clone(), require_auth));

        let optional = Router::new()
            .route(
                "/optional",
                get(|identity: Option<Extension<Identity>>| async move {
                    identity
                        .map(|Extension(identity)| identity.username)
                        .unwrap_or_else(|| "anonymous".to_string())
                }),
            )
            .route_layer(middleware::from_fn_with_state(jwt, optional_auth));

        mandatory.merge(optional)
    }

    async fn call(app: Router, uri: &str, headers: &[(&str, String)]) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }

        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_cookie_takes_precedence_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; token=from-cookie".parse().unwrap());
        headers.insert(AUTHORIZATION, "Bearer from-header".parse().unwrap());

        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwdw==".parse().unwrap());
        assert_eq!(extract_token(&headers), None);
    }

    #[tokio::test]
    async fn test_mandatory_rejects_missing_token() {
        let (status, body) = call(app(jwt()), "/mandatory", &[]).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unauthorized request");
    }

    #[tokio::test]
    async fn test_mandatory_rejects_invalid_token() {
        let (status, _) = call(
            app(jwt()),
            "/mandatory",
            &[("authorization", "Bearer garbage".to_string())],
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mandatory_attaches_identity_from_header_or_cookie() {
        let jwt = jwt();
        let token = jwt.issue(&identity()).unwrap();

        let (status, body) = call(
            app(jwt.clone()),
            "/mandatory",
            &[("authorization", format!("Bearer {token}"))],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bob");

        let (status, body) =
            call(app(jwt), "/mandatory", &[("cookie", format!("token={token}"))]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bob");
    }

    #[tokio::test]
    async fn test_optional_continues_without_identity() {
        let (status, body) = call(app(jwt()), "/optional", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (status, body) = call(
            app(jwt()),
            "/optional",
            &[("authorization", "Bearer garbage".to_string())],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_optional_attaches_valid_identity() {
        let jwt = jwt();
        let token = jwt.issue(&identity()).unwrap();

        let (status, body) = call(
            app(jwt),
            "/optional",
            &[("authorization", format!("Bearer {token}"))],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "bob");
    }
}
