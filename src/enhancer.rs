//! Document enhancer
//!
//! Orchestrates one enrichment run over a document:
//!
//! 1. extract the references of every enabled category, sharing one anchor
//!    counter that continues after the anchors already in the document
//!    (sequential, mutates the tree)
//! 2. resolve the four reference sets concurrently, each under the fetch
//!    timeout
//! 3. merge the resolved records into the header (sequential)
//!
//! The run works on a staging copy of the document. The caller's tree is
//! replaced only once every step has finished, so an error or a cancelled
//! future leaves it exactly as it was.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::category::Category;
use crate::config::EnhancerConfig;
use crate::document::TeiDocument;
use crate::entity::EntityRecord;
use crate::error::{EnhanceError, Result};
use crate::extract::{ReferenceExtractor, ReferenceSet};
use crate::fetch::{AuthorityFetcher, FetchError};
use crate::merge::{HeaderMerger, MergeOutcome};

/// A category whose lookup failed or timed out
#[derive(Debug, Clone, Serialize)]
pub struct CategoryFailure {
    pub category: Category,
    pub message: String,
}

/// Outcome of one document run
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnhanceReport {
    pub document_id: String,
    /// New header entries per category
    pub added: BTreeMap<Category, usize>,
    /// Local anchors written onto mentions during this run
    pub anchors_created: u64,
    pub failures: Vec<CategoryFailure>,
    /// `xml:id` values that could not be assigned because they were taken
    pub id_conflicts: Vec<String>,
}

impl EnhanceReport {
    /// Total number of new header entries
    pub fn added(&self) -> usize {
        self.added.values().sum()
    }

    pub fn added_for(&self, category: Category) -> usize {
        self.added.get(&category).copied().unwrap_or(0)
    }
}

/// Drives extract → fetch → merge for one document at a time
pub struct Enhancer {
    fetcher: Arc<dyn AuthorityFetcher>,
    config: EnhancerConfig,
    merger: HeaderMerger,
}

impl Enhancer {
    pub fn new(fetcher: Arc<dyn AuthorityFetcher>, config: EnhancerConfig) -> Self {
        Self {
            fetcher,
            config,
            merger: HeaderMerger::new(),
        }
    }

    /// Build an enhancer with settings loaded from a YAML file
    pub fn from_config_file(
        fetcher: Arc<dyn AuthorityFetcher>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let config = EnhancerConfig::from_file(path)?;
        Ok(Self::new(fetcher, config))
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    /// Add header entries for every resolvable mention; returns the count added
    pub async fn add_references(&self, document: &mut TeiDocument) -> Result<usize> {
        Ok(self.enhance(document).await?.added())
    }

    /// Run the full enhancement and report what changed
    #[instrument(skip_all, fields(document_id = tracing::field::Empty))]
    pub async fn enhance(&self, document: &mut TeiDocument) -> Result<EnhanceReport> {
        let mut working = document.clone();
        let document_id = working.document_id()?;
        if !working.has_header() {
            return Err(EnhanceError::MissingElement("teiHeader"));
        }
        tracing::Span::current().record("document_id", document_id.as_str());

        let categories = self.config.enabled_categories();
        let extractor = ReferenceExtractor::new(document_id.as_str());
        let mut counter = extractor.counter_for(&working);
        let batches: Vec<(Category, ReferenceSet)> = categories
            .iter()
            .map(|&category| {
                let refs =
                    extractor.extract(&mut working, category.spec().mention_tag, &mut counter);
                (category, refs)
            })
            .collect();

        let lookups = batches
            .into_iter()
            .map(|(category, refs)| self.fetch_category(category, refs));
        let results = join_all(lookups).await;

        let mut report = EnhanceReport {
            document_id,
            anchors_created: counter.created(),
            ..Default::default()
        };
        for (category, result) in results {
            let records = match result {
                Ok(records) => records,
                Err(e) => {
                    warn!(category = %category, error = %e, "Authority lookup failed, skipping category");
                    report.failures.push(CategoryFailure {
                        category,
                        message: e.to_string(),
                    });
                    Vec::new()
                }
            };
            let added = self.merge_category(&mut working, category, &records, &mut report)?;
            report.added.insert(category, added);
        }

        *document = working;
        info!(
            added = report.added(),
            anchors = report.anchors_created,
            failures = report.failures.len(),
            "Document enhanced"
        );
        Ok(report)
    }

    async fn fetch_category(
        &self,
        category: Category,
        refs: ReferenceSet,
    ) -> (Category, std::result::Result<Vec<EntityRecord>, FetchError>) {
        if refs.is_empty() {
            return (category, Ok(Vec::new()));
        }
        let timeout = self.config.fetch_timeout();
        let lookup = category.spec().operation.invoke(self.fetcher.as_ref(), &refs);
        match tokio::time::timeout(timeout, lookup).await {
            Ok(result) => (category, result),
            Err(_) => (category, Err(FetchError::Timeout(timeout))),
        }
    }

    fn merge_category(
        &self,
        document: &mut TeiDocument,
        category: Category,
        records: &[EntityRecord],
        report: &mut EnhanceReport,
    ) -> Result<usize> {
        let spec = category.spec();
        let mut existing = document.existing_entities(&spec);
        let mut added = 0;

        for record in records {
            let outcome = self.merger.merge(document, &spec, record, &existing)?;
            if let MergeOutcome::AddedWithIdConflict { id } = &outcome {
                report.id_conflicts.push(id.clone());
            }
            if outcome.is_added() {
                info!(category = %category, name = %record.name, reference = %record.reference, "Found entity");
                existing.insert(record.clone());
                added += 1;
            }
        }
        Ok(added)
    }
}
