//! Session bootstrap and render cycle.
//!
//! The `Bootstrapper` owns all dashboard state. It reacts to page load,
//! external sign-in and sign-out, drives the profile and assignment fetches,
//! and re-renders the whole page after every state transition.

pub mod bootstrapper;
pub mod state;

pub use bootstrapper::{BootstrapHandle, Bootstrapper, Services};
pub use state::SessionState;
