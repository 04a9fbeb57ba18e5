//! Core library for the schedulo assignment dashboard.
//!
//! The dashboard shows the signed-in user's profile and their assignment list.
//! `bootstrap::Bootstrapper` ties the pieces together:
//!
//! - `auth`: credential token storage and the third-party sign-in widget
//! - `api`: profile and assignment fetching over HTTP
//! - `view`: escaped page rendering and render targets
//! - `cache`: last good assignment list on disk
//! - `login`: the name/password login form
//! - `config`: file and environment configuration

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod login;
pub mod models;
pub mod view;

pub use bootstrap::{BootstrapHandle, Bootstrapper, Services, SessionState};
pub use config::Config;
