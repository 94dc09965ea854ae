//! citesurf Common Library
//!
//! Shared code for the citesurf crates including:
//! - Bibliographic document model and identifier normalization
//! - Lookup provider abstraction (Crossref, PubMed, in-memory)
//! - Error types and handling
//! - Configuration management
//! - Metrics helpers

pub mod config;
pub mod errors;
pub mod lookup;
pub mod metrics;
pub mod model;
pub mod text;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use lookup::LookupProvider;
pub use model::{Author, Document, DocumentPatch, Reference};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Crossref API endpoint
pub const DEFAULT_CROSSREF_URL: &str = "https://api.crossref.org";

/// Default NCBI E-utilities endpoint
pub const DEFAULT_PUBMED_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default probability of jumping back to a seed on each step
pub const DEFAULT_BACK_TO_START_WEIGHT: f64 = 0.15;
