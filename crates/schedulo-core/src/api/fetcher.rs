use async_trait::async_trait;

use crate::models::{Assignment, Profile};

use super::FetchError;

/// Reads the signed-in user's profile with a credential token.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, FetchError>;
}

/// Reads the full assignment list.
#[async_trait]
pub trait AssignmentFetcher: Send + Sync {
    async fn fetch_assignments(&self) -> Result<Vec<Assignment>, FetchError>;
}
