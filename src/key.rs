//! Short-key validation and generation.

use rand::Rng;
use rand::distributions::{Alphanumeric, Distribution};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ShortenError;

/// Upper bound on regeneration attempts when a random key collides.
pub const MAX_ATTEMPTS: usize = 100;

/// Key length used when none is configured (or when it is configured as 0).
pub const DEFAULT_KEY_LENGTH: usize = 5;

/// Longest key that may be generated.
pub const MAX_KEY_LENGTH: usize = 64;

static ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static regex"));

/// Check a caller-supplied key.
///
/// # Errors
/// [`ShortenError::NonAlphanumericKey`] if `key` is empty or contains anything
/// outside `[A-Za-z0-9]`.
pub fn validate(key: &str) -> Result<(), ShortenError> {
    if ALNUM.is_match(key) {
        Ok(())
    } else {
        Err(ShortenError::NonAlphanumericKey(key.to_string()))
    }
}

/// Draw `len` symbols uniformly from `[0-9A-Za-z]`.
pub fn random_key<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(Alphanumeric.sample(&mut *rng)))
        .collect()
}

/// Map a requested generated-key length to the one actually used.
///
/// 0 means [`DEFAULT_KEY_LENGTH`].
///
/// # Errors
/// [`ShortenError::KeyLengthOutOfRange`] above [`MAX_KEY_LENGTH`].
pub fn effective_length(len: usize) -> Result<usize, ShortenError> {
    match len {
        0 => Ok(DEFAULT_KEY_LENGTH),
        n if n > MAX_KEY_LENGTH => Err(ShortenError::KeyLengthOutOfRange {
            length: n,
            max: MAX_KEY_LENGTH,
        }),
        n => Ok(n),
    }
}

/// Generate a key that `taken` reports as free.
///
/// `len` goes through [`effective_length`]. Collisions are retried up to
/// [`MAX_ATTEMPTS`] times.
///
/// # Errors
/// - [`ShortenError::KeyLengthOutOfRange`] for an oversized `len`.
/// - [`ShortenError::KeySpaceExhausted`] if every attempt collided.
pub fn unique_key<R, F>(rng: &mut R, len: usize, taken: F) -> Result<String, ShortenError>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let len = effective_length(len)?;
    for attempt in 1..=MAX_ATTEMPTS {
        let key = random_key(rng, len);
        if !taken(&key) {
            return Ok(key);
        }
        tracing::debug!(attempt, key = %key, "generated key collides, retrying");
    }
    Err(ShortenError::KeySpaceExhausted {
        attempts: MAX_ATTEMPTS,
    })
}
