//! HTTP client for the profile and assignment endpoints.
//!
//! The profile endpoint is the identity provider's OpenID Connect userinfo
//! endpoint and is called with the stored credential as a bearer token. The
//! assignment list comes from the dashboard's own API and needs no credential.

pub mod client;
pub mod error;
pub mod fetcher;

pub use client::{ApiClient, DEFAULT_API_BASE_URL, DEFAULT_PROFILE_URL};
pub use error::{FailureKind, FetchError};
pub use fetcher::{AssignmentFetcher, ProfileFetcher};
