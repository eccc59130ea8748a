//! Element attribute storage

use std::collections::HashMap;

/// Attribute map of an element.
///
/// Keys are unique; iteration order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    map: HashMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or replace, returning the previous value
    pub(crate) fn set(&mut self, key: &str, value: &str) -> Option<String> {
        self.map.insert(key.to_string(), value.to_string())
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<String> {
        self.map.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Value of the `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    /// Whitespace separated words of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_words() {
        let mut attrs = Attributes::new();
        attrs.set("class", "  card  primary\tlarge ");
        let classes: Vec<_> = attrs.classes().collect();
        assert_eq!(classes, vec!["card", "primary", "large"]);
        assert!(attrs.has_class("primary"));
        assert!(!attrs.has_class("prim"));
    }

    #[test]
    fn test_set_returns_previous() {
        let mut attrs = Attributes::new();
        assert_eq!(attrs.set("id", "a"), None);
        assert_eq!(attrs.set("id", "b"), Some("a".to_string()));
        assert_eq!(attrs.id(), Some("b"));
        assert_eq!(attrs.remove("id"), Some("b".to_string()));
        assert!(attrs.is_empty());
    }
}
