//! Bibliographic data model
//!
//! Documents are identified by their citation identifier (usually a DOI).
//! References are the unresolved stubs a document cites; a reference only
//! becomes a [`Document`] once a lookup provider resolves its identifier.

mod document;

pub use document::{Author, Document, DocumentPatch, Reference};
