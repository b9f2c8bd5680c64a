//! Publishing the ledger through version control.
//!
//! The rest of the crate only sees the [`Publisher`] trait; the `git2`
//! implementation lives in `git2_backend` and is re-exported here.

mod git2_backend;

pub use git2_backend::Git2Publisher;

use crate::error::PublishError;

/// Persist a ledger change to the remote repository.
pub trait Publisher {
    /// Stage, commit with `message`, and push.
    fn publish(&self, message: &str) -> Result<(), PublishError>;
}

/// Commit message recorded for a newly added short key.
pub fn commit_message(short_key: &str) -> String {
    format!("add /{short_key}")
}
