//! In-memory authority
//!
//! Resolves references against fixed record tables, one per fetch
//! operation. External references match a record's reference or any of its
//! link targets; local anchors match on normalized name. Useful for tests
//! and for embedding pre-harvested authority data.

use async_trait::async_trait;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;
use url::Url;

use super::{AuthorityFetcher, FetchError};
use crate::entity::EntityRecord;
use crate::extract::{Reference, ReferenceSet};

/// Record tables as loaded from YAML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorityTables {
    #[serde(default)]
    pub places: Vec<EntityRecord>,
    #[serde(default)]
    pub concepts: Vec<EntityRecord>,
    #[serde(default)]
    pub agents: Vec<EntityRecord>,
}

#[derive(Debug, Clone, Default)]
struct AuthorityTable {
    records: Vec<EntityRecord>,
}

impl AuthorityTable {
    fn resolve(&self, refs: &ReferenceSet) -> Vec<EntityRecord> {
        refs.iter().filter_map(|r| self.resolve_one(r)).collect()
    }

    fn resolve_one(&self, reference: &Reference) -> Option<EntityRecord> {
        let found = match reference {
            Reference::ExternalRef { id, .. } => {
                let wanted = canonical_url(id);
                self.records
                    .iter()
                    .find(|rec| rec.identities().any(|known| canonical_url(known) == wanted))
            }
            Reference::LocalAnchor { text, .. } => {
                let wanted = normalize_name(text);
                if wanted.is_empty() {
                    return None;
                }
                self.records
                    .iter()
                    .find(|rec| normalize_name(&rec.name) == wanted)
            }
        }?;

        let mut record = found.clone();
        record.reference = reference.id().to_string();
        Some(record)
    }
}

/// An `AuthorityFetcher` backed by in-memory record tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthority {
    places: AuthorityTable,
    concepts: AuthorityTable,
    agents: AuthorityTable,
}

impl InMemoryAuthority {
    pub fn new(tables: AuthorityTables) -> Self {
        Self {
            places: AuthorityTable {
                records: tables.places,
            },
            concepts: AuthorityTable {
                records: tables.concepts,
            },
            agents: AuthorityTable {
                records: tables.agents,
            },
        }
    }

    /// Load tables from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let tables: AuthorityTables = serde_yaml::from_str(content)?;
        Ok(Self::new(tables))
    }

    pub fn with_place(mut self, record: EntityRecord) -> Self {
        self.places.records.push(record);
        self
    }

    pub fn with_concept(mut self, record: EntityRecord) -> Self {
        self.concepts.records.push(record);
        self
    }

    pub fn with_agent(mut self, record: EntityRecord) -> Self {
        self.agents.records.push(record);
        self
    }
}

#[async_trait]
impl AuthorityFetcher for InMemoryAuthority {
    async fn fetch_places(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError> {
        Ok(self.places.resolve(refs))
    }

    async fn fetch_concepts(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError> {
        Ok(self.concepts.resolve(refs))
    }

    async fn fetch_historical_agents(
        &self,
        refs: &ReferenceSet,
    ) -> Result<Vec<EntityRecord>, FetchError> {
        Ok(self.agents.resolve(refs))
    }
}

/// URLs compare in parsed form so host case and default ports don't matter
fn canonical_url(s: &str) -> String {
    match Url::parse(s.trim()) {
        Ok(url) => url.to_string(),
        Err(_) => s.trim().to_string(),
    }
}

/// NFKC fold, lowercase, collapse whitespace
fn normalize_name(s: &str) -> String {
    let folded: String = s.nfkc().collect();
    folded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
