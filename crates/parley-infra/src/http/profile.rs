//! Profile endpoint.

use parley_core::client::ProfileClient;
use parley_core::session::store::SessionStore;
use parley_types::error::ApiError;
use parley_types::user::Profile;

use super::{ApiClient, expect_json};

/// Profile lookups backed by the REST API.
#[derive(Clone)]
pub struct HttpProfileClient<S: SessionStore> {
    api: ApiClient<S>,
}

impl<S: SessionStore> HttpProfileClient<S> {
    pub fn new(api: ApiClient<S>) -> Self {
        Self { api }
    }
}

impl<S: SessionStore> ProfileClient for HttpProfileClient<S> {
    async fn get_profile(&self) -> Result<Profile, ApiError> {
        let response = self.api.get("/api/profile/").await?;
        expect_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_decodes_backend_shape() {
        let profile: Profile = serde_json::from_str(
            r#"{"id": 4, "username": "dana", "created_at": "2024-06-01T09:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(profile.id, 4);
        assert_eq!(profile.username, "dana");
    }
}
