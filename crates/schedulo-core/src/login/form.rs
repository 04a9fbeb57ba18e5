use askama::Template;
use thiserror::Error;
use tracing::{info, warn};

use crate::view::{render_template, Markup};

/// Maximum length for the name field.
const MAX_NAME_LENGTH: usize = 50;

/// Maximum length for the password field.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// What a submission hands to the handler.
#[derive(Debug, Clone, Copy)]
pub struct LoginCredentials<'a> {
    pub name: &'a str,
    pub password: &'a str,
}

/// Receives a validated login submission.
pub trait SubmitHandler {
    fn submit(&self, credentials: &LoginCredentials<'_>) -> anyhow::Result<()>;
}

/// Records the submission in the log and accepts it. The password is never logged.
pub struct LogSubmitHandler;

impl SubmitHandler for LogSubmitHandler {
    fn submit(&self, credentials: &LoginCredentials<'_>) -> anyhow::Result<()> {
        info!(name = credentials.name, "Login submitted");
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Please enter your name and password")]
    MissingFields,

    #[error("Login failed: {0}")]
    Rejected(anyhow::Error),
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    name: &'a str,
    error: Option<&'a str>,
    greeting: Option<String>,
}

#[derive(Default)]
pub struct LoginForm {
    pub name: String,
    password: String,
    pub error: Option<String>,
    logged_in: bool,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("error", &self.error)
            .field("logged_in", &self.logged_in)
            .finish()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form with the name field prefilled.
    pub fn with_name(name: &str) -> Self {
        let mut form = Self::new();
        form.set_name(name);
        form
    }

    pub fn password_len(&self) -> usize {
        self.password.chars().count()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Replace the name, keeping only the characters the field accepts.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        for c in name.chars() {
            if can_add_name_char(self.name.chars().count(), c) {
                self.name.push(c);
            }
        }
    }

    /// Replace the password, keeping only the characters the field accepts.
    pub fn set_password(&mut self, password: &str) {
        self.password.clear();
        for c in password.chars() {
            if can_add_password_char(self.password_len(), c) {
                self.password.push(c);
            }
        }
    }

    /// Validate and hand the form to `handler`.
    ///
    /// Both fields are required; the handler is not called otherwise. After a
    /// successful submission the password is cleared.
    pub fn submit(&mut self, handler: &dyn SubmitHandler) -> Result<(), LoginError> {
        let name = self.name.trim();
        if name.is_empty() || self.password.is_empty() {
            let err = LoginError::MissingFields;
            self.error = Some(err.to_string());
            return Err(err);
        }

        let credentials = LoginCredentials {
            name,
            password: &self.password,
        };

        match handler.submit(&credentials) {
            Ok(()) => {
                self.error = None;
                self.password.clear();
                self.logged_in = true;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Login handler rejected submission");
                let err = LoginError::Rejected(e);
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn greeting(&self) -> Option<String> {
        self.logged_in
            .then(|| format!("Welcome, {}!", self.name.trim()))
    }

    /// The form, or the greeting once logged in.
    pub fn render(&self) -> Markup {
        render_template(&LoginTemplate {
            name: &self.name,
            error: self.error.as_deref(),
            greeting: self.greeting(),
        })
    }
}

// ============================================================================
// Input validation helpers
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a name character should be accepted
pub fn can_add_name_char(current_len: usize, c: char) -> bool {
    current_len < MAX_NAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}
