//! # pubrag-literature
//!
//! Live literature retrieval for pubmed-rag.
//!
//! This crate provides:
//! - Raw PubMed record model and efetch XML reader
//! - Record normalizer producing uniform [`ArticleRecord`]s
//! - NCBI E-utilities client implementing [`LiteratureSource`]
//! - Literature fetcher with bounded, order-preserving concurrency
//!
//! [`ArticleRecord`]: pubrag_core::ArticleRecord

pub mod eutils;
pub mod fetcher;
pub mod normalize;
pub mod raw;
pub mod source;

pub use eutils::{EutilsClient, EutilsConfig};
pub use fetcher::LiteratureFetcher;
pub use normalize::normalize;
pub use raw::{
    parse_pubmed_xml, RawArticle, RawAuthor, RawJournal, RawMeshHeading, RawPubDate,
    RawPubmedArticle,
};
pub use source::LiteratureSource;
