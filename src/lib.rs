//! Crate entry point for **netshort**.
//!
//! This library provides the implementation behind the `netshort` CLI, a link
//! shortener for static sites that serve a `_redirects` file. Each submodule
//! owns one responsibility (config, key handling, the ledger file, git
//! publishing). The `pub use` re-exports expose the commands and the types
//! needed to drive an update programmatically.

pub mod config;
mod error;
pub mod git;
mod key;
pub mod ledger;
mod list;
mod paths;
mod progress;
pub mod shorten;

pub use config::{Config, load_config};
pub use error::{PublishError, ShortenError};
pub use git::{Git2Publisher, Publisher};
pub use ledger::{Ledger, RedirectEntry};
pub use list::cmd_list;
pub use paths::{config_path, ledger_path};
pub use shorten::{ShortenOutcome, ShortenRequest, cmd_shorten, shorten, update_ledger};
