//! Name/password login form.
//!
//! One form component whose submission is delegated to an injected
//! `SubmitHandler`; the form itself only enforces that both fields are filled
//! and bounded. No authentication happens here.

pub mod form;

pub use form::{
    can_add_name_char, can_add_password_char, LogSubmitHandler, LoginCredentials, LoginError,
    LoginForm, SubmitHandler,
};
