//! Lookup provider abstraction
//!
//! Resolves a citation identifier into a [`Document`]:
//! - Crossref works API
//! - PubMed (NCBI E-utilities)
//! - In-memory documents (offline corpora, tests)
//! - Gap-filling from a secondary provider

mod crossref;
mod http;
mod pubmed;

pub use crossref::CrossrefClient;
pub use pubmed::PubMedClient;

use crate::config::LookupConfig;
use crate::errors::{AppError, Result};
use crate::model::Document;
use crate::text::normalize_identifier;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

/// Trait for identifier resolution
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Resolve an identifier into a full document
    async fn resolve(&self, identifier: &str) -> Result<Document>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: LookupProvider + ?Sized> LookupProvider for Arc<T> {
    async fn resolve(&self, identifier: &str) -> Result<Document> {
        (**self).resolve(identifier).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Provider serving a fixed set of documents from memory
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    documents: HashMap<String, Document>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from documents, keyed by their identifiers
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| (doc.identifier().to_string(), doc))
            .collect();
        Self { documents }
    }

    /// Read a JSON array of documents
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let documents: Vec<Document> = serde_json::from_reader(reader)?;
        Ok(Self::from_documents(documents))
    }

    pub fn insert(&mut self, document: Document) {
        self.documents.insert(document.identifier().to_string(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl LookupProvider for StaticLookup {
    async fn resolve(&self, identifier: &str) -> Result<Document> {
        let key = normalize_identifier(identifier);
        self.documents
            .get(&key)
            .cloned()
            .ok_or(AppError::LookupNotFound { identifier: key })
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Resolves through `primary`, then fills absent fields from `secondary`.
///
/// With `prefer_secondary_year` the secondary is always consulted and its
/// publication year wins over the primary's.
pub struct EnrichingLookup<P, S> {
    primary: P,
    secondary: S,
    prefer_secondary_year: bool,
}

impl<P, S> EnrichingLookup<P, S>
where
    P: LookupProvider,
    S: LookupProvider,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            prefer_secondary_year: false,
        }
    }

    pub fn prefer_secondary_year(mut self, prefer: bool) -> Self {
        self.prefer_secondary_year = prefer;
        self
    }
}

fn is_incomplete(document: &Document) -> bool {
    document.title.is_none() || document.authors.is_empty() || document.year.is_none()
}

#[async_trait]
impl<P, S> LookupProvider for EnrichingLookup<P, S>
where
    P: LookupProvider,
    S: LookupProvider,
{
    async fn resolve(&self, identifier: &str) -> Result<Document> {
        let mut document = self.primary.resolve(identifier).await?;
        if !self.prefer_secondary_year && !is_incomplete(&document) {
            return Ok(document);
        }

        match self.secondary.resolve(document.identifier()).await {
            Ok(extra) => {
                let year = extra.year;
                document.fill_missing(extra);
                if self.prefer_secondary_year && year.is_some() {
                    document.year = year;
                }
            }
            Err(e) => debug!(
                identifier = %document.identifier(),
                provider = self.secondary.name(),
                error = %e,
                "Secondary lookup failed, keeping primary record"
            ),
        }
        Ok(document)
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}

/// Create a lookup provider based on configuration.
///
/// When `lookup.secondary` is set the primary provider is wrapped in an
/// [`EnrichingLookup`].
pub fn create_lookup(config: &LookupConfig) -> Result<Arc<dyn LookupProvider>> {
    let primary = create_provider(&config.provider, config)?;
    let Some(name) = config.secondary.as_deref() else {
        return Ok(primary);
    };

    let secondary = create_provider(name, config)?;
    info!(
        primary = primary.name(),
        secondary = secondary.name(),
        prefer_secondary_year = config.prefer_secondary_year,
        "Enriching lookups from secondary provider"
    );
    Ok(Arc::new(
        EnrichingLookup::new(primary, secondary)
            .prefer_secondary_year(config.prefer_secondary_year),
    ))
}

fn create_provider(name: &str, config: &LookupConfig) -> Result<Arc<dyn LookupProvider>> {
    match name {
        "crossref" => Ok(Arc::new(CrossrefClient::new(config)?)),
        "pubmed" => Ok(Arc::new(PubMedClient::new(config)?)),
        "static" => {
            let path = config.static_path.as_ref().ok_or_else(|| AppError::Configuration {
                message: "lookup.static_path is required for the static provider".to_string(),
            })?;
            let file = std::fs::File::open(path)?;
            let lookup = StaticLookup::from_json_reader(std::io::BufReader::new(file))?;
            info!(documents = lookup.len(), path = %path.display(), "Loaded static lookup");
            Ok(Arc::new(lookup))
        }
        other => Err(AppError::Configuration {
            message: format!("Unknown lookup provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, Reference};

    #[tokio::test]
    async fn test_static_lookup_resolves_normalized() {
        let lookup = StaticLookup::from_documents(vec![
            Document::new("10.1/abc").with_title("A"),
        ]);
        let doc = lookup.resolve("https://doi.org/10.1/ABC").await.unwrap();
        assert_eq!(doc.title.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_static_lookup_unknown() {
        let lookup = StaticLookup::new();
        let err = lookup.resolve("10.1/missing").await.unwrap_err();
        assert!(matches!(err, AppError::LookupNotFound { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_enriching_lookup_fills_gaps() {
        let primary = StaticLookup::from_documents(vec![Document::new("10.1/a")
            .with_title("Crossref title")
            .with_references(vec![Reference::to("10.1/b")])]);
        let secondary = StaticLookup::from_documents(vec![Document::new("10.1/a")
            .with_title("Other title")
            .with_authors(vec![Author::new("Reza")])
            .with_year(2023)]);

        let lookup = EnrichingLookup::new(primary, secondary);
        let doc = lookup.resolve("10.1/a").await.unwrap();
        assert_eq!(doc.title.as_deref(), Some("Crossref title"));
        assert_eq!(doc.first_author(), Some("Reza"));
        assert_eq!(doc.year, Some(2023));
        assert_eq!(doc.references.len(), 1);
    }

    #[tokio::test]
    async fn test_enriching_lookup_tolerates_secondary_failure() {
        let primary = StaticLookup::from_documents(vec![Document::new("10.1/a")]);
        let lookup = EnrichingLookup::new(primary, StaticLookup::new());
        let doc = lookup.resolve("10.1/a").await.unwrap();
        assert_eq!(doc.identifier(), "10.1/a");
    }

    #[tokio::test]
    async fn test_enriching_lookup_prefers_secondary_year() {
        let complete = Document::new("10.1/a")
            .with_title("Crossref title")
            .with_authors(vec![Author::new("Howard")])
            .with_year(2022);
        let secondary = StaticLookup::from_documents(vec![Document::new("10.1/a")
            .with_title("PubMed title")
            .with_year(2023)]);

        let lookup = EnrichingLookup::new(
            StaticLookup::from_documents(vec![complete.clone()]),
            secondary.clone(),
        )
        .prefer_secondary_year(true);
        let doc = lookup.resolve("10.1/a").await.unwrap();
        assert_eq!(doc.year, Some(2023));
        assert_eq!(doc.title.as_deref(), Some("Crossref title"));
        assert_eq!(doc.first_author(), Some("Howard"));

        let lookup = EnrichingLookup::new(StaticLookup::from_documents(vec![complete]), secondary);
        let doc = lookup.resolve("10.1/a").await.unwrap();
        assert_eq!(doc.year, Some(2022));
    }

    #[tokio::test]
    async fn test_enriching_lookup_over_shared_providers() {
        let primary: Arc<dyn LookupProvider> =
            Arc::new(StaticLookup::from_documents(vec![Document::new("10.1/a")]));
        let secondary: Arc<dyn LookupProvider> = Arc::new(StaticLookup::from_documents(vec![
            Document::new("10.1/a").with_authors(vec![Author::new("Reza")]),
        ]));
        let lookup = EnrichingLookup::new(primary, secondary);
        assert_eq!(lookup.name(), "static");
        let doc = lookup.resolve("10.1/a").await.unwrap();
        assert_eq!(doc.first_author(), Some("Reza"));
    }

    #[test]
    fn test_static_lookup_from_json() {
        let json = r#"[{"identifier": "10.1/a", "title": "A", "references": [{"identifier": "10.1/b"}]}]"#;
        let lookup = StaticLookup::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn test_create_lookup_rejects_unknown_provider() {
        let config = LookupConfig {
            provider: "scopus".to_string(),
            ..Default::default()
        };
        assert!(create_lookup(&config).is_err());

        let config = LookupConfig {
            secondary: Some("scopus".to_string()),
            ..Default::default()
        };
        assert!(create_lookup(&config).is_err());

        let config = LookupConfig {
            provider: "static".to_string(),
            ..Default::default()
        };
        assert!(matches!(create_lookup(&config), Err(AppError::Configuration { .. })));
    }

    #[test]
    fn test_create_lookup_with_secondary() {
        let config = LookupConfig {
            secondary: Some("pubmed".to_string()),
            ..Default::default()
        };
        let lookup = create_lookup(&config).unwrap();
        assert_eq!(lookup.name(), "crossref");

        let config = LookupConfig {
            provider: "pubmed".to_string(),
            ..Default::default()
        };
        assert_eq!(create_lookup(&config).unwrap().name(), "pubmed");
    }
}
