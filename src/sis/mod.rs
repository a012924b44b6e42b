//! SIS API client and payload types.

mod client;
mod types;

pub use client::{SisClient, SisCredentials};
pub use types::{
    filter_enrollment_status, lecture_codes, ClassSection, Enrollment, Identifier,
    SectionDescriptor, Term, TermSelector, LECTURE_KEYWORDS,
};
