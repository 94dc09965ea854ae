//! Crossref works API client
//!
//! `GET {base}/works/{doi}` returns a `work` message carrying title, authors,
//! dates and (when deposited by the publisher) the reference list.

use super::http::{default_policy, with_retries, Attempt, HttpFetcher};
use super::LookupProvider;
use crate::config::LookupConfig;
use crate::errors::{AppError, Result};
use crate::model::{Author, Document, Reference};
use crate::text::normalize_identifier;
use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

/// Crossref lookup client
pub struct CrossrefClient {
    http: HttpFetcher,
    base_url: Url,
    mailto: Option<String>,
}

#[derive(Deserialize)]
struct WorksEnvelope {
    #[serde(rename = "message-type")]
    message_type: String,
    message: Work,
}

#[derive(Deserialize)]
struct Work {
    #[serde(rename = "DOI")]
    doi: String,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<WorkAuthor>,
    issued: Option<PartialDate>,
    published: Option<PartialDate>,
    created: Option<PartialDate>,
    #[serde(default)]
    reference: Vec<WorkReference>,
}

#[derive(Deserialize)]
struct WorkAuthor {
    family: Option<String>,
    given: Option<String>,
    /// Organisational authors only carry a name
    name: Option<String>,
}

#[derive(Deserialize)]
struct PartialDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
    #[serde(rename = "date-time")]
    date_time: Option<String>,
}

#[derive(Deserialize)]
struct WorkReference {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "article-title")]
    article_title: Option<String>,
    unstructured: Option<String>,
    author: Option<String>,
    year: Option<String>,
}

impl PartialDate {
    fn year(&self) -> Option<i32> {
        self.date_parts
            .first()
            .and_then(|parts| parts.first().copied().flatten())
            .or_else(|| {
                self.date_time
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|dt| dt.year())
            })
    }
}

impl Work {
    fn into_document(self) -> Document {
        let year = [&self.issued, &self.published, &self.created]
            .into_iter()
            .flatten()
            .find_map(PartialDate::year);

        let title = self.title.into_iter().find(|t| !t.trim().is_empty());

        let authors = self
            .author
            .into_iter()
            .filter_map(|a| {
                let family = a.family.or(a.name)?;
                let author = Author::new(family);
                Some(match a.given {
                    Some(given) => author.with_given(given),
                    None => author,
                })
            })
            .collect();

        let references = self
            .reference
            .into_iter()
            .map(WorkReference::into_reference)
            .collect();

        let mut document = Document::new(&self.doi).with_authors(authors).with_references(references);
        document.title = title;
        document.year = year;
        document
    }
}

impl WorkReference {
    fn into_reference(self) -> Reference {
        let title = self.article_title.or(self.unstructured);
        let mut reference = match self.doi.as_deref() {
            Some(doi) => Reference::to(doi),
            None => Reference::without_identifier(None),
        };
        reference.title = title;
        reference.author = self.author;
        reference.year = self.year.as_deref().and_then(|y| y.trim().parse().ok());
        reference
    }
}

/// Parse a raw works API response body
fn parse_work(identifier: &str, body: &str) -> Result<Document> {
    let envelope: WorksEnvelope = serde_json::from_str(body)?;
    if envelope.message_type != "work" {
        return Err(AppError::lookup(
            identifier,
            format!("unexpected message type '{}'", envelope.message_type),
        ));
    }
    Ok(envelope.message.into_document())
}

impl CrossrefClient {
    /// Create a new Crossref client
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| AppError::Configuration {
            message: format!("Invalid lookup.base_url '{}': {}", config.base_url, e),
        })?;

        Ok(Self {
            http: HttpFetcher::new(config)?,
            base_url,
            mailto: config.mailto.clone(),
        })
    }

    fn works_url(&self, doi: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration {
                message: format!("lookup.base_url cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .push("works")
            .push(doi);
        if let Some(mailto) = &self.mailto {
            url.query_pairs_mut().append_pair("mailto", mailto);
        }
        Ok(url)
    }

    /// Make one request; transient failures are marked for retry
    async fn fetch_once(&self, doi: &str) -> Attempt<Document> {
        let url = self.works_url(doi).map_err(backoff::Error::permanent)?;
        let body = self.http.get_text(doi, url).await?;
        parse_work(doi, &body).map_err(backoff::Error::permanent)
    }
}

#[async_trait]
impl LookupProvider for CrossrefClient {
    async fn resolve(&self, identifier: &str) -> Result<Document> {
        let doi = normalize_identifier(identifier);
        let document = with_retries(
            self.name(),
            &doi,
            self.http.max_retries(),
            default_policy(),
            || self.fetch_once(&doi),
        )
        .await?;

        debug!(doi = %doi, references = document.references.len(), "Found work");
        Ok(document)
    }

    fn name(&self) -> &str {
        "crossref"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK: &str = r#"{
        "status": "ok",
        "message-type": "work",
        "message": {
            "DOI": "10.1016/S1473-3099(23)00113-5",
            "title": ["ChatGPT and antimicrobial advice: the end of the consulting infection doctor?"],
            "author": [
                {"given": "Alex", "family": "Howard", "sequence": "first"},
                {"name": "Infection Consortium"},
                {"given": "Alessandro", "family": "Gerada", "sequence": "additional"}
            ],
            "created": {"date-parts": [[2023, 2, 24]], "date-time": "2023-02-24T10:00:00Z"},
            "issued": {"date-parts": [[null]]},
            "reference-count": 3,
            "reference": [
                {"key": "r1", "DOI": "10.1056/NEJMsr2214184", "article-title": "Benefits, limits, and risks", "year": "2023"},
                {"key": "r2", "unstructured": "Smith J. Some report. 2019."},
                {"key": "r3"}
            ]
        }
    }"#;

    #[test]
    fn test_parse_work() {
        let doc = parse_work("x", WORK).unwrap();
        assert_eq!(doc.identifier(), "10.1016/s1473-3099(23)00113-5");
        assert!(doc.title.as_deref().unwrap().starts_with("ChatGPT"));
        assert_eq!(doc.authors.len(), 3);
        assert_eq!(doc.first_author(), Some("Howard"));
        assert_eq!(doc.last_author(), Some("Gerada"));
        assert_eq!(doc.year, Some(2023));

        assert_eq!(doc.references.len(), 3);
        assert_eq!(doc.references[0].identifier(), Some("10.1056/nejmsr2214184"));
        assert_eq!(doc.references[0].year, Some(2023));
        assert_eq!(doc.references[1].identifier(), None);
        assert_eq!(doc.references[1].title.as_deref(), Some("Smith J. Some report. 2019."));
        assert_eq!(doc.references[2].describe(), "<empty reference>");
    }

    #[test]
    fn test_parse_year_from_timestamp() {
        let body = r#"{"message-type": "work", "message": {
            "DOI": "10.1/a", "created": {"date-time": "2021-06-01T00:00:00Z"}
        }}"#;
        let doc = parse_work("10.1/a", body).unwrap();
        assert_eq!(doc.year, Some(2021));
        assert!(doc.title.is_none());
        assert!(!doc.has_references());
    }

    #[test]
    fn test_parse_rejects_non_work() {
        let body = r#"{"message-type": "work-list", "message": {"DOI": "10.1/a"}}"#;
        assert!(matches!(parse_work("10.1/a", body), Err(AppError::LookupFailed { .. })));
    }

    #[test]
    fn test_works_url_encodes_doi() {
        let config = LookupConfig {
            mailto: Some("surf@example.org".to_string()),
            ..Default::default()
        };
        let client = CrossrefClient::new(&config).unwrap();
        let url = client.works_url("10.1000/182").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.crossref.org/works/10.1000%2F182?mailto=surf%40example.org"
        );
    }
}
