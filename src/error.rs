//! Error types surfaced to the user.
//!
//! Every failure of a `shorten` run maps to one variant here so that the
//! message printed on exit is stable and distinct per cause.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the ledger update itself.
#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("URL not valid: {0}")]
    InvalidUrl(String),

    #[error("key must be alphanumeric: {0}")]
    NonAlphanumericKey(String),

    #[error("ledger not found (missing or a directory): {}", .0.display())]
    LedgerNotFound(PathBuf),

    #[error("ledger directory not configured (set app.path or NETSHORT_APP_PATH)")]
    LedgerUnconfigured,

    #[error("malformed line {line} in ledger: expected `<key> <url>`")]
    MalformedLine { line: usize },

    #[error("short key already exists: /{0}")]
    DuplicateKey(String),

    #[error("key length {length} out of range (1..={max}, 0 for default)")]
    KeyLengthOutOfRange { length: usize, max: usize },

    #[error("could not generate a unique key after {attempts} attempts")]
    KeySpaceExhausted { attempts: usize },

    #[error("failed to write ledger {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read ledger {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the publish step (stage, commit, push).
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no git repository found for {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error("ledger {} is outside the repository work tree", .0.display())]
    OutsideWorkTree(PathBuf),

    #[error("cannot determine branch to push (HEAD is detached or unborn)")]
    NoBranch,

    #[error("push of {branch} rejected by remote: {detail}")]
    PushRejected { branch: String, detail: String },

    #[error(transparent)]
    Git(#[from] git2::Error),
}
