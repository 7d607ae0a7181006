//! Unique generated-identifier minting.
//!
//! Generated Möbius/Maple bindings (seed draws, engine results, loop
//! counters) must not collide within one generated document. Uniqueness
//! beyond a single run is not required, so random suffixes backed by a
//! per-document used-name set are sufficient.

use std::collections::HashSet;

use rand::Rng;
use rand::distr::Alphanumeric;

const SUFFIX_LEN: usize = 8;

/// Mints collision-free identifiers of the form `<stem>_<suffix>`.
#[derive(Debug, Default)]
pub struct NameMinter {
    used: HashSet<String>,
}

impl NameMinter {
    /// Create a minter with no reserved names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name so future mints won't produce it.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// Mint a fresh identifier starting with `stem`.
    pub fn mint(&mut self, stem: &str) -> String {
        loop {
            let suffix: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(SUFFIX_LEN)
                .map(char::from)
                .collect();
            let candidate = format!("{stem}_{suffix}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
