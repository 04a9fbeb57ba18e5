//! Data models for dashboard entities.
//!
//! - `Profile`: the user record returned by the identity provider's profile endpoint
//! - `Session`: the in-memory "currently signed in" record derived from a `Profile`
//! - `Assignment`: a course task with a due date, displayed read-only

pub mod assignment;
pub mod profile;

pub use assignment::{Assignment, DEFAULT_DATE_FORMAT};
pub use profile::{Profile, Session};
