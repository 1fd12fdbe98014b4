//! Passphrase strength estimation and the new-passphrase policy.
//!
//! Scoring is advisory and uses zxcvbn, so dictionary words, l33t
//! substitutions, dates and keyboard patterns all count against a passphrase.
//! The only hard rules, applied by the front end when a container is created,
//! are a minimum length and a matching confirmation.

use crate::error::{Error, Result};
use zxcvbn::zxcvbn;

const LABELS: [&str; 5] = ["Very weak", "Weak", "Fair", "Good", "Strong"];

/// Strength estimate for a passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strength {
    /// Score from 0 (trivial) to 4 (strong).
    pub level: u8,
    /// Human-readable label for `level`.
    pub label: &'static str,
}

impl Strength {
    fn from_level(level: u8) -> Self {
        let level = level.min(4);
        Self {
            level,
            label: LABELS[level as usize],
        }
    }
}

/// Score a passphrase from 0 to 4.
pub fn score(passphrase: &str) -> Strength {
    if passphrase.is_empty() {
        return Strength::from_level(0);
    }
    Strength::from_level(zxcvbn(passphrase, &[]).score() as u8)
}

/// Enforce the policy for a new passphrase: length and confirmation.
pub fn check_new_passphrase(passphrase: &str, confirmation: &str, min_len: usize) -> Result<()> {
    if passphrase.chars().count() < min_len {
        return Err(Error::PassphrasePolicy(format!(
            "must be at least {} characters",
            min_len
        )));
    }
    if passphrase != confirmation {
        return Err(Error::PassphrasePolicy(
            "confirmation does not match".to_string(),
        ));
    }
    Ok(())
}
