use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Ids stored at a key that ends here. Non-empty means "end of word".
    ids: Vec<Uuid>,
}

/// Case-insensitive prefix tree mapping words and phrases to record ids.
#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
    keys: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key` (lowercased, trimmed) pointing at `id`. Blank keys are ignored.
    pub fn insert(&mut self, key: &str, id: Uuid) {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.ids.is_empty() {
            self.keys += 1;
        }
        if !node.ids.contains(&id) {
            node.ids.push(id);
        }
    }

    /// Distinct ids of every key starting with `prefix`, in ascending id order.
    pub fn starts_with(&self, prefix: &str) -> Vec<Uuid> {
        let Some(start) = self.find(&prefix.trim().to_lowercase()) else {
            return Vec::new();
        };
        let mut found = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            found.extend(node.ids.iter().copied());
            stack.extend(node.children.values());
        }
        found.into_iter().collect()
    }

    /// Number of distinct keys stored.
    pub fn key_count(&self) -> usize {
        self.keys
    }

    fn find(&self, key: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in key.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_case_insensitive() {
        let mut trie = Trie::new();
        let id = Uuid::new_v4();
        trie.insert("Machine", id);
        assert_eq!(trie.starts_with("mac"), vec![id]);
        assert_eq!(trie.starts_with("MACH"), vec![id]);
        assert!(trie.starts_with("x").is_empty());
    }

    #[test]
    fn test_key_inside_longer_key_counts_separately() {
        let mut trie = Trie::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        trie.insert("career", a);
        trie.insert("Car", b);
        assert_eq!(trie.key_count(), 2);
        assert_eq!(trie.starts_with("care"), vec![a]);
        let mut both = vec![a, b];
        both.sort();
        assert_eq!(trie.starts_with("car"), both);
    }

    #[test]
    fn test_same_id_under_many_keys_is_returned_once() {
        let mut trie = Trie::new();
        let id = Uuid::new_v4();
        trie.insert("tech", id);
        trie.insert("technology", id);
        trie.insert("tech", id);
        assert_eq!(trie.starts_with("te"), vec![id]);
        assert_eq!(trie.key_count(), 2);
    }

    #[test]
    fn test_phrase_keys_match_multiword_prefix() {
        let mut trie = Trie::new();
        let id = Uuid::new_v4();
        trie.insert("Sample Tech Company", id);
        assert_eq!(trie.starts_with("sample tech"), vec![id]);
    }

    #[test]
    fn test_blank_keys_ignored() {
        let mut trie = Trie::new();
        trie.insert("   ", Uuid::new_v4());
        assert_eq!(trie.key_count(), 0);
    }

    #[test]
    fn test_collects_from_all_branches() {
        let mut trie = Trie::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        trie.insert("data", a);
        trie.insert("database", b);
        trie.insert("design", b);
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(trie.starts_with("da"), expected);
        assert_eq!(trie.starts_with("d"), expected);
    }
}
