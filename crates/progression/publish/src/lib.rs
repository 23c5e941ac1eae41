//! # progression-publish
//!
//! Ordered validation that must pass before member-authored content goes
//! live.
//!
//! ## Pipeline
//!
//! ```text
//! NotStarted --(gate: publish allowed)--> Running --> Passed
//!     |                                      \
//!     +--(gate denies)--> PermissionDenied    +--> Failed(check)
//! ```
//!
//! - The action gate is asked before any check runs; a denial is reported
//!   as `PermissionDenied`, never as a check failure.
//! - Checks run in declared order and the first failure ends the run.
//! - Every terminal state is final for that run. After edits the caller
//!   starts a fresh run; there is no resume.
//!
//! [`Publisher`] ties a passing run to a reward credit on the author's
//! balance ledger.

#![deny(unsafe_code)]

pub mod check;
pub mod checks;
pub mod draft;
pub mod pipeline;
pub mod publisher;

pub use check::{check_fn, CheckVerdict, FnCheck, PublicationCheck};
pub use checks::{EmptyFieldCheck, LengthCheck, SpamCheck, TagLimitCheck};
pub use draft::ContentDraft;
pub use pipeline::{PipelineState, PublicationPipeline, PublicationReport};
pub use publisher::{PublishReceipt, Publisher};
