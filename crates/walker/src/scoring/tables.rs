//! Lookup tables consulted by the scorer

use citesurf_common::text::fold;
use std::collections::BTreeSet;

/// Ordered `(keyword, weight)` pairs; keywords are stored folded
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    entries: Vec<(String, f64)>,
}

impl KeywordTable {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, weight)| (fold(key.trim()), weight))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(key, weight)| (key.as_str(), *weight))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Folded family names whose papers earn author credit
#[derive(Debug, Clone, Default)]
pub struct ImportantAuthors {
    names: Vec<String>,
}

impl ImportantAuthors {
    pub fn new(names: Vec<String>) -> Self {
        let mut authors = Self::default();
        for name in names {
            authors.add(&name);
        }
        authors
    }

    /// Append a name unless already listed. Returns true when added.
    pub fn add(&mut self, family: &str) -> bool {
        let name = fold(family.trim());
        if name.is_empty() || self.names.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// True when any listed name occurs in the folded family name
    pub fn matches(&self, family: &str) -> bool {
        let family = fold(family);
        self.names.iter().any(|name| family.contains(name.as_str()))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Keyword to color tag mapping for rendering
#[derive(Debug, Clone, Default)]
pub struct ColorTable {
    entries: Vec<(String, String)>,
}

impl ColorTable {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, color)| (fold(key.trim()), color.trim().to_string()))
            .filter(|(key, color)| !key.is_empty() && !color.is_empty())
            .collect();
        Self { entries }
    }

    /// Colors of every keyword contained in an already folded title
    pub fn matching(&self, folded_title: &str) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|(key, _)| folded_title.contains(key.as_str()))
            .map(|(_, color)| color.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table_folds_and_drops_empty() {
        let table = KeywordTable::new(vec![
            (" Céphalosporin ".to_string(), 2.0),
            ("".to_string(), 9.0),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().next(), Some(("cephalosporin", 2.0)));
    }

    #[test]
    fn test_important_authors_dedup() {
        let mut authors = ImportantAuthors::new(vec!["Gerada".into(), "gerada".into()]);
        assert_eq!(authors.len(), 1);
        assert!(!authors.add("GERADA"));
        assert!(authors.add("Reza"));
        assert_eq!(authors.names(), &["gerada".to_string(), "reza".to_string()]);
    }

    #[test]
    fn test_color_table_same_color_collapses() {
        let table = ColorTable::new(vec![
            ("amoxicillin".to_string(), "#FFAA00".to_string()),
            ("penicillin".to_string(), "#FFAA00".to_string()),
        ]);
        let colors = table.matching("amoxicillin and penicillin allergy");
        assert_eq!(colors.len(), 1);
    }
}
