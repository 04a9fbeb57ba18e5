//! API client for the profile and assignment endpoints.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{Assignment, Profile};

use super::{AssignmentFetcher, FetchError, ProfileFetcher};

// ============================================================================
// Constants
// ============================================================================

/// Google's OpenID Connect userinfo endpoint
pub const DEFAULT_PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Base URL of the dashboard API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Path of the assignment list below the API base URL
const ASSIGNMENTS_PATH: &str = "/api/assignments";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    profile_url: String,
    api_base_url: String,
}

impl ApiClient {
    pub fn new(profile_url: impl Into<String>, api_base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            profile_url: profile_url.into(),
            api_base_url: api_base_url.into(),
        })
    }

    fn assignments_url(&self) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), ASSIGNMENTS_PATH)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::from_status(status, &body))
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T, FetchError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl ProfileFetcher for ApiClient {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, FetchError> {
        debug!(url = %self.profile_url, "Fetching profile");

        let response = self
            .client
            .get(&self.profile_url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::decode(response, &self.profile_url).await
    }
}

#[async_trait]
impl AssignmentFetcher for ApiClient {
    async fn fetch_assignments(&self) -> Result<Vec<Assignment>, FetchError> {
        let url = self.assignments_url();
        debug!(url = %url, "Fetching assignments");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let assignments: Vec<Assignment> = Self::decode(response, &url).await?;
        debug!(count = assignments.len(), "Assignments fetched");
        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FailureKind;
    use mockito::{Matcher, Server};

    const USERINFO_PATH: &str = "/oauth2/v3/userinfo";

    fn client_for(server: &Server) -> ApiClient {
        ApiClient::new(format!("{}{}", server.url(), USERINFO_PATH), server.url()).unwrap()
    }

    #[test]
    fn test_assignments_url_joins_base() {
        let api = ApiClient::new(DEFAULT_PROFILE_URL, "http://localhost:8000/").unwrap();
        assert_eq!(api.assignments_url(), "http://localhost:8000/api/assignments");

        let api = ApiClient::new(DEFAULT_PROFILE_URL, DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(api.assignments_url(), "http://localhost:8000/api/assignments");
    }

    #[tokio::test]
    async fn test_fetch_profile_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", USERINFO_PATH)
            .match_header("authorization", "Bearer T1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sub":"42","name":"Ada","picture":"u.png"}"#)
            .create_async()
            .await;

        let profile = client_for(&server).fetch_profile("T1").await.unwrap();
        m.assert_async().await;

        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.picture, "u.png");
    }

    #[tokio::test]
    async fn test_fetch_profile_unauthorized() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", USERINFO_PATH)
            .with_status(401)
            .with_body(r#"{"error":"invalid_token"}"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_profile("stale").await.unwrap_err();
        m.assert_async().await;

        assert!(err.is_unauthorized());
        assert_eq!(err.kind(), FailureKind::Network);
    }

    #[tokio::test]
    async fn test_fetch_profile_missing_fields_is_decode_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", USERINFO_PATH)
            .with_status(200)
            .with_body(r#"{"sub":"42"}"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_profile("T1").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn test_fetch_assignments() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/assignments")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"course":"CS50","title":"PSet 1","due":"2024-01-10"}]"#)
            .create_async()
            .await;

        let assignments = client_for(&server).fetch_assignments().await.unwrap();
        m.assert_async().await;

        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].course, "CS50");
        assert_eq!(assignments[0].title, "PSet 1");
        assert_eq!(assignments[0].due, "2024-01-10");
    }

    #[tokio::test]
    async fn test_fetch_assignments_empty_list() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/assignments")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        assert!(client_for(&server).fetch_assignments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_assignments_server_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/assignments")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client_for(&server).fetch_assignments().await.unwrap_err();
        assert!(matches!(err, FetchError::Status { .. }));
        assert_eq!(err.kind(), FailureKind::Network);
    }

    #[tokio::test]
    async fn test_fetch_assignments_not_a_list() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/assignments")
            .with_status(200)
            .with_body(r#"{"assignments":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_assignments().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let api = ApiClient::new("http://127.0.0.1:1/userinfo", "http://127.0.0.1:1").unwrap();
        let err = api.fetch_assignments().await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
