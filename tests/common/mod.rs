//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tei_enhancer::{AuthorityFetcher, EntityRecord, FetchError, InMemoryAuthority, ReferenceSet};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A TEI document with the given id attribute, header content and body paragraphs
pub fn tei(xml_id: &str, header: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0" xml:id="{xml_id}">
  <teiHeader>
    <fileDesc>
      <titleStmt><title>Letter</title></titleStmt>
      <sourceDesc>{header}</sourceDesc>
    </fileDesc>
  </teiHeader>
  <text>
    <body>{body}</body>
  </text>
</TEI>
"#
    )
}

/// Authority data covering one entity per category
pub fn authority() -> InMemoryAuthority {
    InMemoryAuthority::default()
        .with_place(
            EntityRecord::new("Paris", "http://sws.geonames.org/2988507/")
                .with_geo(48.85341, 2.3488)
                .with_link("geonames", "http://sws.geonames.org/2988507/"),
        )
        .with_concept(
            EntityRecord::new("Deportation", "https://portal.ehri-project.eu/keywords/ehri_terms-1")
                .with_link("ehri", "https://portal.ehri-project.eu/keywords/ehri_terms-1")
                .with_note("Forced removal of people"),
        )
        .with_agent(EntityRecord::new("Jane Doe", "https://portal.ehri-project.eu/authorities/jd"))
        .with_agent(EntityRecord::new(
            "Joint Distribution Committee",
            "https://portal.ehri-project.eu/authorities/jdc",
        ))
}

/// Resolves every reference of every category to a record with a fixed name
pub struct NamingAuthority {
    pub name: String,
}

impl NamingAuthority {
    fn resolve(&self, refs: &ReferenceSet) -> Vec<EntityRecord> {
        refs.iter()
            .map(|r| EntityRecord::new(self.name.clone(), r.id()))
            .collect()
    }
}

#[async_trait]
impl AuthorityFetcher for NamingAuthority {
    async fn fetch_places(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError> {
        Ok(self.resolve(refs))
    }

    async fn fetch_concepts(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError> {
        Ok(self.resolve(refs))
    }

    async fn fetch_historical_agents(
        &self,
        refs: &ReferenceSet,
    ) -> Result<Vec<EntityRecord>, FetchError> {
        Ok(self.resolve(refs))
    }
}

/// Wraps an authority: places can fail, every call can be delayed
pub struct FlakyAuthority {
    pub inner: InMemoryAuthority,
    pub fail_places: bool,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FlakyAuthority {
    pub fn new(inner: InMemoryAuthority) -> Self {
        Self {
            inner,
            fail_places: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn before_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AuthorityFetcher for FlakyAuthority {
    async fn fetch_places(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError> {
        self.before_call().await;
        if self.fail_places {
            return Err(FetchError::Unavailable("gazetteer returned 503".into()));
        }
        self.inner.fetch_places(refs).await
    }

    async fn fetch_concepts(&self, refs: &ReferenceSet) -> Result<Vec<EntityRecord>, FetchError> {
        self.before_call().await;
        self.inner.fetch_concepts(refs).await
    }

    async fn fetch_historical_agents(
        &self,
        refs: &ReferenceSet,
    ) -> Result<Vec<EntityRecord>, FetchError> {
        self.before_call().await;
        self.inner.fetch_historical_agents(refs).await
    }
}
