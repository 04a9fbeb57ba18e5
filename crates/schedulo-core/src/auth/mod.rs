//! Authentication plumbing for the dashboard session.
//!
//! This module provides:
//! - `CredentialStore`: persistence of the single opaque credential token,
//!   backed by a JSON file or the OS keychain
//! - `IdentityProvider`: the third-party sign-in widget, consumed only through
//!   the token it hands back
//!
//! The token is never parsed or validated here.

pub mod credentials;
pub mod identity;

pub use credentials::{
    CredentialBackend, CredentialStore, FileCredentialStore, KeyringCredentialStore, TOKEN_KEY,
};
pub use identity::{
    CredentialResponder, GoogleIdentity, IdentityProvider, TokenCallback, CREDENTIAL_FIELD_ID,
    SIGN_IN_MOUNT_ID,
};
