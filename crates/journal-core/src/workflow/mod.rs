//! User-facing workflows: submitting a new entry and listing your own.
//!
//! Both read the current identity from the [`IdentitySession`] handle they
//! are given at the start of every call.
//!
//! [`IdentitySession`]: crate::auth::IdentitySession

mod list;
mod submit;

pub use list::{ListingState, ListingWorkflow};
pub use submit::{SubmissionEvent, SubmissionStage, SubmissionWorkflow};
