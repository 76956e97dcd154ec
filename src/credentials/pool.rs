//! Immutable credential pool.

use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

/// Ordered set of opaque credentials, loaded once at startup.
///
/// Cloning is cheap and shares the same storage. `Debug` never prints keys.
#[derive(Clone, Default)]
pub struct CredentialPool {
    keys: Arc<[String]>,
}

impl CredentialPool {
    /// Build a pool, dropping blanks and duplicates while keeping order.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for key in keys {
            let key = key.as_ref().trim();
            if !key.is_empty() && !unique.iter().any(|k| k == key) {
                unique.push(key.to_string());
            }
        }
        Self { keys: unique.into() }
    }

    /// Parse a comma-separated list such as `"k1, k2,,k3"`.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Read the comma-separated list from an environment variable.
    /// A missing or non-unicode variable yields an empty pool.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(list) => Self::from_list(&list),
            Err(_) => Self::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Every credential exactly once, in uniformly random order.
    pub fn permutation(&self) -> Vec<&str> {
        self.permutation_with(&mut rand::thread_rng())
    }

    /// Same as [`permutation`](Self::permutation) with a caller-supplied RNG.
    pub fn permutation_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&str> {
        let mut order: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        order.shuffle(rng);
        order
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.keys.len())
            .finish()
    }
}

/// Masked trailing fragment of a credential, safe to log.
///
/// Short keys are fully masked since their tail would be most of the key.
pub fn key_hint(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "…".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("…{tail}")
}
