//! Authority fetcher abstraction
//!
//! This module defines the `AuthorityFetcher` trait that lets any authority
//! service (gazetteer, agent registry, thesaurus) resolve the references
//! extracted from a document. Implementations own their transport; the
//! enhancer only sees batches in and records out.

mod memory;

pub use memory::{AuthorityTables, InMemoryAuthority};

use std::time::Duration;

use async_trait::async_trait;

use crate::entity::EntityRecord;
use crate::extract::ReferenceSet;

/// Errors an authority lookup can report
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("authority service unavailable: {0}")]
    Unavailable(String),

    #[error("authority lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Resolves batches of references into normalized records.
///
/// Each call receives every candidate of one category and returns only the
/// references it could resolve; unresolved entries are left out rather than
/// reported as errors. Returned records must carry the reference id they
/// were resolved from.
///
/// Implementations must be Send + Sync: the enhancer issues the calls for
/// different categories concurrently.
#[async_trait]
pub trait AuthorityFetcher: Send + Sync {
    /// Resolve place names or gazetteer URLs to geocoded places
    async fn fetch_places(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError>;

    /// Resolve controlled-vocabulary terms
    async fn fetch_concepts(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError>;

    /// Resolve person or organization names/URLs to historical-agent records
    async fn fetch_historical_agents(
        &self,
        refs: &ReferenceSet,
    ) -> Result<Vec<EntityRecord>, FetchError>;
}

/// Which fetcher operation a category resolves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchOperation {
    Places,
    Concepts,
    HistoricalAgents,
}

impl FetchOperation {
    pub async fn invoke<F>(
        self,
        fetcher: &F,
        refs: &ReferenceSet,
    ) -> Result<Vec<EntityRecord>, FetchError>
    where
        F: AuthorityFetcher + ?Sized,
    {
        match self {
            FetchOperation::Places => fetcher.fetch_places(refs).await,
            FetchOperation::Concepts => fetcher.fetch_concepts(refs).await,
            FetchOperation::HistoricalAgents => fetcher.fetch_historical_agents(refs).await,
        }
    }
}
