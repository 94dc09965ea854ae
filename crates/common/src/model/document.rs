//! Document, author and reference types

use crate::text::normalize_identifier;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single author of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Family name (always present)
    pub family: String,

    /// Given name(s), when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
}

impl Author {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            given: None,
        }
    }

    pub fn with_given(mut self, given: impl Into<String>) -> Self {
        self.given = Some(given.into());
        self
    }
}

/// A cited-reference stub as listed in a document's bibliography
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Citation identifier; absent when the bibliography entry was never matched
    #[serde(default, deserialize_with = "deserialize_optional_identifier")]
    identifier: Option<String>,

    /// Title as printed in the bibliography
    #[serde(default)]
    pub title: Option<String>,

    /// First author as printed in the bibliography
    #[serde(default)]
    pub author: Option<String>,

    /// Publication year as printed in the bibliography
    #[serde(default)]
    pub year: Option<i32>,
}

impl Reference {
    /// Reference pointing at a known identifier
    pub fn to(identifier: impl AsRef<str>) -> Self {
        Self {
            identifier: clean(identifier.as_ref()),
            ..Default::default()
        }
    }

    /// Reference with no identifier, known only by its title
    pub fn without_identifier(title: Option<String>) -> Self {
        Self {
            identifier: None,
            title,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Normalized identifier, if the entry carries one
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Human-readable description used in log lines
    pub fn describe(&self) -> &str {
        self.identifier
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("<empty reference>")
    }
}

/// Bibliographic record of a seed or discovered document.
///
/// Equality and hashing use the identifier only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(deserialize_with = "deserialize_identifier")]
    identifier: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Ordered author list; first and last positions are significant for scoring
    #[serde(default)]
    pub authors: Vec<Author>,

    #[serde(default)]
    pub year: Option<i32>,

    /// Ordered bibliography
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// In-place overwrite of document fields from a secondary data source.
///
/// Unknown fields are rejected when a patch is deserialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentPatch {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Vec<Author>>,
    pub year: Option<i32>,
    pub references: Option<Vec<Reference>>,
}

impl Document {
    /// Create a document with no metadata besides its identifier
    pub fn new(identifier: impl AsRef<str>) -> Self {
        Self {
            identifier: normalize_identifier(identifier.as_ref()),
            title: None,
            authors: Vec::new(),
            year: None,
            references: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_authors(mut self, authors: Vec<Author>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.references = references;
        self
    }

    /// Normalized citation identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(|a| a.family.as_str())
    }

    pub fn last_author(&self) -> Option<&str> {
        self.authors.last().map(|a| a.family.as_str())
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    /// Short display label: `"<first author> <year>"`
    pub fn label(&self) -> String {
        let author = self.first_author().unwrap_or("?");
        match self.year {
            Some(year) => format!("{} {}", author, year),
            None => format!("{} ?", author),
        }
    }

    /// Overwrite fields present in `patch`.
    ///
    /// Returns the previous identifier when the patch changed it, so an owning
    /// collection can re-key the document.
    pub fn apply(&mut self, patch: DocumentPatch) -> Option<String> {
        let mut previous = None;
        if let Some(identifier) = patch.identifier {
            let identifier = normalize_identifier(&identifier);
            if identifier != self.identifier {
                previous = Some(std::mem::replace(&mut self.identifier, identifier));
            }
        }
        if let Some(title) = patch.title {
            self.title = Some(title);
        }
        if let Some(authors) = patch.authors {
            self.authors = authors;
        }
        if let Some(year) = patch.year {
            self.year = Some(year);
        }
        if let Some(references) = patch.references {
            self.references = references;
        }
        previous
    }

    /// Fill absent title, authors, year and references from `other`.
    ///
    /// Never touches the identifier or any field that is already set.
    pub fn fill_missing(&mut self, other: Document) {
        if self.title.as_deref().map_or(true, str::is_empty) {
            self.title = other.title;
        }
        if self.authors.is_empty() {
            self.authors = other.authors;
        }
        if self.year.is_none() {
            self.year = other.year;
        }
        if self.references.is_empty() {
            self.references = other.references;
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.identifier,
            self.label(),
            self.title.as_deref().unwrap_or("<untitled>")
        )
    }
}

fn clean(raw: &str) -> Option<String> {
    let identifier = normalize_identifier(raw);
    (!identifier.is_empty()).then_some(identifier)
}

fn deserialize_identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_identifier(&raw))
}

fn deserialize_optional_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(clean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn handbook() -> Document {
        Document::new("10.1000/182")
            .with_title("DOI Handbook")
            .with_authors(vec![Author::new("Paskin"), Author::new("Foundation")])
            .with_year(2019)
            .with_references(vec![
                Reference::to("10.1016/S1473-3099(23)00113-5").with_title("ChatGPT and infection"),
            ])
    }

    #[test]
    fn test_identity_by_identifier() {
        let a = Document::new("https://doi.org/10.1000/182");
        let b = handbook();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_reference_identifier_normalized() {
        let doc = handbook();
        let reference = &doc.references[0];
        assert_eq!(reference.identifier(), Some("10.1016/s1473-3099(23)00113-5"));
        assert_eq!(Reference::to("  ").identifier(), None);
        assert_eq!(Reference::without_identifier(None).describe(), "<empty reference>");
    }

    #[test]
    fn test_first_and_last_author() {
        let doc = handbook();
        assert_eq!(doc.first_author(), Some("Paskin"));
        assert_eq!(doc.last_author(), Some("Foundation"));
        assert_eq!(doc.label(), "Paskin 2019");

        let bare = Document::new("x");
        assert_eq!(bare.first_author(), None);
        assert_eq!(bare.label(), "? ?");
    }

    #[test]
    fn test_apply_patch_reports_identifier_change() {
        let mut doc = handbook();
        let previous = doc.apply(DocumentPatch {
            identifier: Some("10.111/123".into()),
            ..Default::default()
        });
        assert_eq!(previous.as_deref(), Some("10.1000/182"));
        assert_eq!(doc.identifier(), "10.111/123");

        let unchanged = doc.apply(DocumentPatch {
            identifier: Some("10.111/123".into()),
            year: Some(2020),
            ..Default::default()
        });
        assert!(unchanged.is_none());
        assert_eq!(doc.year, Some(2020));
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let err = serde_json::from_str::<DocumentPatch>(r#"{"new_data": "x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_fill_missing_keeps_existing_fields() {
        let mut doc = Document::new("10.1/a").with_title("Primary title");
        let secondary = Document::new("10.1/a")
            .with_title("Secondary title")
            .with_authors(vec![Author::new("Howard")])
            .with_year(2023);

        doc.fill_missing(secondary);
        assert_eq!(doc.title.as_deref(), Some("Primary title"));
        assert_eq!(doc.first_author(), Some("Howard"));
        assert_eq!(doc.year, Some(2023));
    }

    #[test]
    fn test_deserialize_normalizes_identifiers() {
        let json = r#"{
            "identifier": "https://doi.org/10.1000/ABC",
            "title": "t",
            "references": [{"identifier": "DOI:10.2/X"}, {"title": "no doi"}]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.identifier(), "10.1000/abc");
        assert_eq!(doc.references[0].identifier(), Some("10.2/x"));
        assert_eq!(doc.references[1].identifier(), None);
    }
}
