//! Synchronize course group membership in a Grouper-style directory
//! from SIS enrollment data.
//!
//! Given a course identified by term, subject area, and catalog number,
//! a run resolves the term, fetches enrolled/waitlisted/dropped
//! students and teaching staff from the SIS, ensures the term/course
//! folder hierarchy exists in the directory, and replaces each
//! subgroup's membership with the fetched campus UIDs.

pub mod config;
pub mod directory;
pub mod error;
pub mod groups;
pub mod reconcile;
pub mod sis;

pub use error::SyncError;
