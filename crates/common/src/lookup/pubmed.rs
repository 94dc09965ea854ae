//! PubMed client over NCBI E-utilities
//!
//! Two requests per identifier:
//! 1. `esearch.fcgi` finds the PubMed id for a DOI
//! 2. `esummary.fcgi` returns title, authors and publication date
//!
//! PubMed carries no reference lists, so documents from this provider are
//! only useful to fill gaps left by a primary provider.

use super::http::{default_policy, with_retries, Attempt, HttpFetcher};
use super::LookupProvider;
use crate::config::LookupConfig;
use crate::errors::{AppError, Result};
use crate::model::{Author, Document};
use crate::text::normalize_identifier;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// PubMed lookup client
pub struct PubMedClient {
    http: HttpFetcher,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    esearchresult: SearchResult,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Deserialize)]
struct SummaryEnvelope {
    result: Map<String, Value>,
}

#[derive(Deserialize)]
struct Summary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<SummaryAuthor>,
    #[serde(default)]
    pubdate: String,
}

#[derive(Deserialize)]
struct SummaryAuthor {
    name: String,
}

impl SummaryAuthor {
    /// PubMed writes `Family Initials`; everything before the last space is
    /// the family name
    fn into_author(self) -> Option<Author> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(match name.rsplit_once(' ') {
            Some((family, given)) if !family.trim().is_empty() => {
                Author::new(family.trim()).with_given(given)
            }
            _ => Author::new(name),
        })
    }
}

/// First PubMed id of an esearch response, if any
fn parse_search(body: &str) -> Result<Option<String>> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;
    Ok(envelope.esearchresult.idlist.into_iter().next())
}

/// Build a document for `doi` from the esummary record of `pmid`
fn parse_summary(doi: &str, pmid: &str, body: &str) -> Result<Document> {
    let mut envelope: SummaryEnvelope = serde_json::from_str(body)?;
    let record = envelope
        .result
        .remove(pmid)
        .ok_or_else(|| AppError::lookup(doi, format!("esummary has no record for PMID {}", pmid)))?;
    let summary: Summary = serde_json::from_value(record)?;

    let title = summary.title.trim().trim_end_matches('.').trim().to_string();
    let year = summary
        .pubdate
        .get(..4)
        .and_then(|y| y.parse::<i32>().ok());
    let authors = summary
        .authors
        .into_iter()
        .filter_map(SummaryAuthor::into_author)
        .collect();

    let mut document = Document::new(doi).with_authors(authors);
    document.title = (!title.is_empty()).then_some(title);
    document.year = year;
    Ok(document)
}

impl PubMedClient {
    /// Create a new PubMed client
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let base_url = Url::parse(&config.pubmed_base_url).map_err(|e| AppError::Configuration {
            message: format!(
                "Invalid lookup.pubmed_base_url '{}': {}",
                config.pubmed_base_url, e
            ),
        })?;

        Ok(Self {
            http: HttpFetcher::new(config)?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, name: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration {
                message: format!("lookup.pubmed_base_url cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(name);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("db", "pubmed").append_pair("retmode", "json");
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            if let Some(api_key) = &self.api_key {
                pairs.append_pair("api_key", api_key);
            }
        }
        Ok(url)
    }

    fn search_url(&self, doi: &str) -> Result<Url> {
        let term = format!("{}[doi]", doi);
        self.endpoint("esearch.fcgi", &[("term", term.as_str())])
    }

    fn summary_url(&self, pmid: &str) -> Result<Url> {
        self.endpoint("esummary.fcgi", &[("id", pmid)])
    }

    async fn search_once(&self, doi: &str) -> Attempt<String> {
        let url = self.search_url(doi).map_err(backoff::Error::permanent)?;
        let body = self.http.get_text(doi, url).await?;
        parse_search(&body)
            .map_err(backoff::Error::permanent)?
            .ok_or_else(|| {
                backoff::Error::permanent(AppError::LookupNotFound {
                    identifier: doi.to_string(),
                })
            })
    }

    async fn summary_once(&self, doi: &str, pmid: &str) -> Attempt<Document> {
        let url = self.summary_url(pmid).map_err(backoff::Error::permanent)?;
        let body = self.http.get_text(doi, url).await?;
        parse_summary(doi, pmid, &body).map_err(backoff::Error::permanent)
    }
}

#[async_trait]
impl LookupProvider for PubMedClient {
    async fn resolve(&self, identifier: &str) -> Result<Document> {
        let doi = normalize_identifier(identifier);
        let max_retries = self.http.max_retries();

        let pmid = with_retries(self.name(), &doi, max_retries, default_policy(), || {
            self.search_once(&doi)
        })
        .await?;
        let document = with_retries(self.name(), &doi, max_retries, default_policy(), || {
            self.summary_once(&doi, &pmid)
        })
        .await?;

        debug!(doi = %doi, pmid = %pmid, authors = document.authors.len(), "Found PubMed record");
        Ok(document)
    }

    fn name(&self) -> &str {
        "pubmed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "header": {"type": "esummary", "version": "0.3"},
        "result": {
            "uids": ["36893779"],
            "36893779": {
                "uid": "36893779",
                "pubdate": "2023 Apr",
                "title": "ChatGPT and antimicrobial advice: the end of the consulting infection doctor?",
                "authors": [
                    {"name": "Howard A", "authtype": "Author"},
                    {"name": "Hope W", "authtype": "Author"},
                    {"name": "van der Berg JP", "authtype": "Author"},
                    {"name": "Consortium", "authtype": "CollectiveName"}
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_search() {
        let body = r#"{"header": {}, "esearchresult": {"count": "1", "idlist": ["36893779"]}}"#;
        assert_eq!(parse_search(body).unwrap().as_deref(), Some("36893779"));

        let empty = r#"{"esearchresult": {"count": "0", "idlist": []}}"#;
        assert_eq!(parse_search(empty).unwrap(), None);
    }

    #[test]
    fn test_parse_summary() {
        let doc = parse_summary("10.1016/s1473-3099(23)00113-5", "36893779", SUMMARY).unwrap();
        assert_eq!(doc.identifier(), "10.1016/s1473-3099(23)00113-5");
        assert!(doc.title.as_deref().unwrap().ends_with("infection doctor?"));
        assert_eq!(doc.year, Some(2023));
        assert_eq!(doc.authors.len(), 4);
        assert_eq!(doc.first_author(), Some("Howard"));
        assert_eq!(doc.authors[1].given.as_deref(), Some("W"));
        assert_eq!(doc.authors[2].family, "van der Berg");
        assert_eq!(doc.last_author(), Some("Consortium"));
        assert!(!doc.has_references());
    }

    #[test]
    fn test_parse_summary_missing_record() {
        let err = parse_summary("10.1/a", "1", SUMMARY).unwrap_err();
        assert!(matches!(err, AppError::LookupFailed { .. }));
    }

    #[test]
    fn test_urls_carry_query() {
        let config = LookupConfig {
            api_key: Some("k3y".to_string()),
            ..Default::default()
        };
        let client = PubMedClient::new(&config).unwrap();
        assert_eq!(
            client.search_url("10.1/a").unwrap().as_str(),
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi?db=pubmed&retmode=json&term=10.1%2Fa%5Bdoi%5D&api_key=k3y"
        );
        assert_eq!(
            client.summary_url("42").unwrap().as_str(),
            "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi?db=pubmed&retmode=json&id=42&api_key=k3y"
        );
    }
}
