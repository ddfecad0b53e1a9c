//! TEI Enhancer - authority enrichment for TEI documents
//!
//! Finds tagged entity mentions (`term`, `orgName`, `persName`,
//! `placeName`) in a TEI document, resolves them against authority services
//! and writes normalized entries into the header's source description.
//! Header entries are never duplicated, and mentions without a reference
//! receive stable local anchors so that repeated runs are idempotent.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Caller: import / update workflow (persists the result)         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Enhancer / BatchEnhancer                        │
//! │     extract (sequential) → fetch (concurrent) → merge           │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                    │                     │
//!          ▼                    ▼                     ▼
//! ┌────────────────────┐ ┌──────────────────┐ ┌──────────────────────┐
//! │ ReferenceExtractor │ │ AuthorityFetcher │ │    HeaderMerger      │
//! │ (anchors mentions) │ │ (per category)   │ │ (dedup-aware insert) │
//! └────────────────────┘ └──────────────────┘ └──────────────────────┘
//!          │                                          │
//!          ▼                                          ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               TeiDocument (owned quick-xml tree)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tei_enhancer::{Enhancer, InMemoryAuthority, TeiDocument};
//!
//! let authority = InMemoryAuthority::from_yaml(&std::fs::read_to_string("authority.yaml")?)?;
//! let enhancer = Enhancer::from_config_file(Arc::new(authority), "enhancer.yaml")?;
//!
//! let mut document = TeiDocument::from_path("letters/doc1.xml")?;
//! let added = enhancer.add_references(&mut document).await?;
//! std::fs::write("letters/doc1.xml", document.to_xml_string()?)?;
//! ```

pub mod batch;
pub mod category;
pub mod config;
pub mod document;
pub mod enhancer;
pub mod entity;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod merge;
pub mod xml;

// Re-export main types
pub use batch::{is_xml_file, BatchEnhancer, BatchReport, DocumentOutcome};
pub use category::{Category, TypeSpec};
pub use config::{ConfigError, EnhancerConfig};
pub use document::TeiDocument;
pub use enhancer::{CategoryFailure, EnhanceReport, Enhancer};
pub use entity::{EntityRecord, ExistingEntities, GeoPoint, Link};
pub use error::EnhanceError;
pub use extract::{AnchorCounter, Reference, ReferenceExtractor, ReferenceSet};
pub use fetch::{AuthorityFetcher, AuthorityTables, FetchError, FetchOperation, InMemoryAuthority};
pub use merge::{HeaderMerger, MergeOutcome};
