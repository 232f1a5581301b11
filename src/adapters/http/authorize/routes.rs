//! Axum router configuration for the authorization flow.

use axum::{routing::get, Router};

use super::handlers::{authorize, authorize_callback, authorize_reset, AuthorizeAppState};

/// Create the authorization router.
///
/// # Routes
/// - `GET /` - Consent redirect
/// - `GET /authorize` - Consent redirect
/// - `GET /authorize/reset` - Consent redirect that rotates the secret
/// - `GET /authorize/callback` - OAuth callback returning `{"secret": ...}`
pub fn authorize_routes() -> Router<AuthorizeAppState> {
    Router::new()
        .route("/", get(authorize))
        .route("/authorize", get(authorize))
        .route("/authorize/reset", get(authorize_reset))
        .route("/authorize/callback", get(authorize_callback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::credentials::InMemoryCredentialStore;
    use crate::adapters::oauth::{MockOAuthProvider, MOCK_AUTHORIZE_URL};
    use crate::adapters::http::authorize::SecretResponse;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(oauth: MockOAuthProvider) -> Router {
        authorize_routes().with_state(AuthorizeAppState {
            oauth: Arc::new(oauth),
            credentials: Arc::new(InMemoryCredentialStore::new()),
        })
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn root_and_authorize_redirect_to_consent() {
        let app = app(MockOAuthProvider::new());

        for uri in ["/", "/authorize"] {
            let response = get(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers()[header::LOCATION], MOCK_AUTHORIZE_URL);
        }
    }

    #[tokio::test]
    async fn reset_redirect_carries_state() {
        let response = get(app(MockOAuthProvider::new()), "/authorize/reset").await;

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.ends_with("state=reset"));
    }

    #[tokio::test]
    async fn callback_returns_secret() {
        let oauth = MockOAuthProvider::new().with_grant("c1", "t1", "8035");
        let response = get(app(oauth), "/authorize/callback?code=c1").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: SecretResponse = serde_json::from_slice(&body).unwrap();
        assert!(!parsed.secret.is_empty());
    }

    #[tokio::test]
    async fn callback_with_bad_code_is_authentication_error() {
        let response = get(app(MockOAuthProvider::new()), "/authorize/callback?code=nope").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Authentication error");
    }
}
