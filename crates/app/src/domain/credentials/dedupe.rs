//! Stable de-duplication of token bindings.

use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Drops every item whose key was already seen, keeping first occurrences
/// in their original order.
pub fn dedupe_by_key<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = FxHashSet::default();

    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Removes repeated values, preserving first-seen order.
pub fn dedupe<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    dedupe_by_key(items, Clone::clone)
}

/// Removes repeated blinded tokens so a duplicate submission never yields a
/// duplicate signed token. Surrounding whitespace is not significant.
pub fn dedupe_blinded_tokens(tokens: impl IntoIterator<Item = String>) -> Vec<String> {
    dedupe_by_key(
        tokens.into_iter().map(|token| token.trim().to_string()),
        Clone::clone,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Binding {
        preimage: &'static str,
        signature: &'static str,
    }

    #[test]
    fn keeps_first_seen_order() {
        assert_eq!(dedupe(["A", "B", "A", "C"]), ["A", "B", "C"]);
    }

    #[test]
    fn dedupes_on_preimage_only() {
        let bindings = [
            Binding {
                preimage: "A",
                signature: "1",
            },
            Binding {
                preimage: "B",
                signature: "2",
            },
            Binding {
                preimage: "A",
                signature: "3",
            },
        ];

        let unique = dedupe_by_key(bindings, |binding| binding.preimage);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].signature, "1");
        assert_eq!(unique[1].preimage, "B");
    }

    #[test]
    fn blinded_tokens_ignore_surrounding_whitespace() {
        let tokens = ["abc", " abc", "def\n"].map(str::to_string);

        assert_eq!(dedupe_blinded_tokens(tokens), ["abc", "def"]);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(dedupe(Vec::<String>::new()).is_empty());
    }
}
