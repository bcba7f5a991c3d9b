//! Auth endpoints: register, login, logout.

use chrono::{DateTime, Utc};
use parley_core::client::AuthClient;
use parley_core::session::store::SessionStore;
use parley_types::error::ApiError;
use parley_types::session::{AuthGrant, Credentials};
use parley_types::user::User;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::{ApiClient, check_status, expect_json};

/// Wire form of a register/login request.
#[derive(Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> CredentialsBody<'a> {
    fn from_credentials(credentials: &'a Credentials) -> Self {
        Self {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        }
    }
}

/// Wire form of a successful register/login response: the user record
/// flattened alongside its token.
#[derive(Deserialize)]
struct AuthUserBody {
    id: i64,
    username: String,
    created_at: DateTime<Utc>,
    token: String,
}

impl AuthUserBody {
    fn into_grant(self) -> AuthGrant {
        AuthGrant {
            token: self.token,
            user: User {
                id: self.id,
                username: self.username,
                created_at: self.created_at,
            },
        }
    }
}

/// Auth backed by the REST API.
#[derive(Clone)]
pub struct HttpAuthClient<S: SessionStore> {
    api: ApiClient<S>,
}

impl<S: SessionStore> HttpAuthClient<S> {
    pub fn new(api: ApiClient<S>) -> Self {
        Self { api }
    }
}

impl<S: SessionStore> AuthClient for HttpAuthClient<S> {
    async fn register(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let body = CredentialsBody::from_credentials(credentials);
        let response = self.api.post("/api/auth/register/", &body).await?;
        let user: AuthUserBody = expect_json(response).await?;
        Ok(user.into_grant())
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let body = CredentialsBody::from_credentials(credentials);
        let response = self.api.post("/api/auth/login/", &body).await?;
        let user: AuthUserBody = expect_json(response).await?;
        Ok(user.into_grant())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self.api.post_empty("/api/auth/logout/").await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_serialize_with_exposed_password() {
        let credentials = Credentials {
            username: "alice".to_string(),
            password: "hunter2".to_string().into(),
        };
        let body = CredentialsBody::from_credentials(&credentials);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["password"], "hunter2");
    }

    #[test]
    fn auth_user_body_splits_into_token_and_user() {
        let body: AuthUserBody = serde_json::from_str(
            r#"{
                "id": 7,
                "username": "alice",
                "created_at": "2024-05-01T12:00:00Z",
                "token": "abc123"
            }"#,
        )
        .unwrap();
        let grant = body.into_grant();
        assert_eq!(grant.token, "abc123");
        assert_eq!(grant.user.id, 7);
        assert_eq!(grant.user.username, "alice");
    }

    #[test]
    fn extra_response_fields_are_ignored() {
        let body: AuthUserBody = serde_json::from_str(
            r#"{
                "id": 1,
                "username": "bob",
                "created_at": "2024-05-01T12:00:00Z",
                "token": "t",
                "is_staff": false
            }"#,
        )
        .unwrap();
        assert_eq!(body.into_grant().user.username, "bob");
    }
}
