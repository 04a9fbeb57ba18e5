use std::fmt;

/// Where the bootstrapper is in the sign-in lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Before `start` has looked at the credential store
    #[default]
    Unknown,
    SignedOut,
    /// A profile fetch for a stored or freshly received token is in flight
    SigningIn,
    SignedIn,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unknown => write!(f, "unknown"),
            SessionState::SignedOut => write!(f, "signed out"),
            SessionState::SigningIn => write!(f, "signing in"),
            SessionState::SignedIn => write!(f, "signed in"),
        }
    }
}
