mod request;

pub use request::{ShortenOutcome, ShortenRequest};

use anyhow::{Context, Result};
use colored::Colorize;
use rand::Rng;
use std::io::IsTerminal;
use std::path::Path;

use crate::config::load_config;
use crate::error::ShortenError;
use crate::git::{Git2Publisher, Publisher, commit_message};
use crate::key;
use crate::ledger::{self, RedirectEntry};
use crate::progress::{err_style, ok_style, spinner};

/// Add one entry to the ledger at `path` and rewrite it.
///
/// Steps:
/// 1. Load and parse the ledger.
/// 2. Use the requested key, or generate one of `key_length` symbols that is
///    not yet taken (bounded retries). A `key_length` of 0 means the default.
/// 3. Reject a requested key that already exists.
/// 4. Prepend the entry and atomically rewrite the file with every key padded
///    to the new common width.
///
/// # Errors
/// Any [`ShortenError`] from loading, key selection, or writing. On error the
/// file on disk is unchanged.
pub fn update_ledger<R: Rng + ?Sized>(
    path: &Path,
    req: ShortenRequest,
    key_length: usize,
    rng: &mut R,
) -> Result<ShortenOutcome, ShortenError> {
    let (target, requested) = req.into_parts();
    let mut ledger = ledger::load(path)?;

    let (key, generated) = match requested {
        Some(k) if ledger.contains_key(&k) => return Err(ShortenError::DuplicateKey(k)),
        Some(k) => (k, false),
        None => (
            key::unique_key(rng, key_length, |k| ledger.contains_key(k))?,
            true,
        ),
    };

    ledger.prepend(RedirectEntry::for_short_key(&key, &target));
    ledger::store(path, &ledger)?;
    tracing::info!(key = %key, generated, entries = ledger.len(), "ledger updated");

    Ok(ShortenOutcome {
        key,
        target,
        generated,
    })
}

/// Update the ledger, then hand the change to `publisher` if one is given.
///
/// # Errors
/// - Any ledger error from [`update_ledger`].
/// - A publish failure. The rewritten ledger is kept in that case.
pub fn shorten(
    path: &Path,
    req: ShortenRequest,
    key_length: usize,
    publisher: Option<&dyn Publisher>,
) -> Result<ShortenOutcome> {
    let outcome = update_ledger(path, req, key_length, &mut rand::thread_rng())?;
    if let Some(p) = publisher {
        p.publish(&commit_message(&outcome.key)).with_context(|| {
            format!(
                "ledger updated with /{} but publishing failed",
                outcome.key
            )
        })?;
    }
    Ok(outcome)
}

/// CLI command: shorten `url`, optionally under `key`, and publish.
///
/// Inputs are validated before the config or ledger is read.
///
/// # Errors
/// Invalid input, config problems, ledger errors, or a failed publish.
pub fn cmd_shorten(
    config: Option<&Path>,
    url: &str,
    key: Option<&str>,
    no_publish: bool,
) -> Result<()> {
    let req = ShortenRequest::new(url, key)?;
    let cfg = load_config(config)?;
    let path = cfg.ledger_path()?;

    let publisher = (cfg.git.enabled && !no_publish).then(|| Git2Publisher::new(&path, &cfg.git));
    let pb = spinner(
        format!("updating {}", path.display()),
        std::io::stderr().is_terminal(),
    );
    if publisher.is_some() {
        pb.set_message(format!("updating {} and publishing", path.display()));
    }

    match shorten(
        &path,
        req,
        cfg.key_length(),
        publisher.as_ref().map(|p| p as &dyn Publisher),
    ) {
        Ok(outcome) => {
            pb.set_style(ok_style());
            pb.finish_and_clear();
            println!(
                "{} {} {}",
                format!("/{}", outcome.key).green().bold(),
                "->".dimmed(),
                outcome.target
            );
            Ok(())
        }
        Err(e) => {
            pb.set_style(err_style());
            pb.finish_with_message(format!("shorten {url} failed"));
            Err(e)
        }
    }
}
