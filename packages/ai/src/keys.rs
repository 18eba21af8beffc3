//! Round-robin API key rotation.
//!
//! Free-tier generative model keys carry tight per-key rate limits, so
//! requests are spread across every configured key. One rotation is built
//! per process and shared by reference with the provider that uses it.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Highest numbered `GEMINI_API_KEY_<n>` variable consulted.
const MAX_NUMBERED_KEYS: usize = 5;

/// A fixed list of API keys handed out in round-robin order.
#[derive(Debug)]
pub struct ApiKeyRotation {
    keys: Vec<String>,
    next: AtomicUsize,
}

impl ApiKeyRotation {
    /// Builds a rotation over `keys`, skipping blank entries.
    #[must_use]
    pub fn new(keys: Vec<String>) -> Self {
        let keys = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            keys,
            next: AtomicUsize::new(0),
        }
    }

    /// A rotation containing a single key.
    #[must_use]
    pub fn single(key: String) -> Self {
        Self::new(vec![key])
    }

    /// Reads `<prefix>_1` through `<prefix>_5`, falling back to `<prefix>`
    /// alone when none of the numbered variables are set.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let numbered: Vec<String> = (1..=MAX_NUMBERED_KEYS)
            .filter_map(|i| lookup(&format!("{prefix}_{i}")))
            .collect();

        let rotation = Self::new(numbered);
        if !rotation.is_empty() {
            log::info!("Loaded {} {prefix} keys for rotation", rotation.len());
            return rotation;
        }

        Self::new(lookup(prefix).into_iter().collect())
    }

    /// Returns the next key, or `None` when no keys are configured.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Some(self.keys[idx].as_str())
    }

    /// Number of usable keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn rotates_round_robin() {
        let rotation = ApiKeyRotation::new(vec!["a".into(), "b".into(), "c".into()]);
        let seen: Vec<&str> = (0..7).filter_map(|_| rotation.next()).collect();
        assert_eq!(seen, ["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn empty_rotation_yields_none() {
        let rotation = ApiKeyRotation::new(vec![" ".into()]);
        assert!(rotation.is_empty());
        assert_eq!(rotation.next(), None);
    }

    #[test]
    fn numbered_keys_take_priority() {
        let rotation = ApiKeyRotation::from_lookup(
            "GEMINI_API_KEY",
            lookup(&[
                ("GEMINI_API_KEY", "plain"),
                ("GEMINI_API_KEY_1", "one"),
                ("GEMINI_API_KEY_3", "three"),
            ]),
        );
        assert_eq!(rotation.len(), 2);
        assert_eq!(rotation.next(), Some("one"));
        assert_eq!(rotation.next(), Some("three"));
    }

    #[test]
    fn falls_back_to_unnumbered_key() {
        let rotation =
            ApiKeyRotation::from_lookup("GEMINI_API_KEY", lookup(&[("GEMINI_API_KEY", "plain")]));
        assert_eq!(rotation.len(), 1);
        assert_eq!(rotation.next(), Some("plain"));
    }

    #[test]
    fn ignores_keys_past_the_fifth() {
        let rotation =
            ApiKeyRotation::from_lookup("GEMINI_API_KEY", lookup(&[("GEMINI_API_KEY_6", "six")]));
        assert!(rotation.is_empty());
    }
}
