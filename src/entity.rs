//! Normalized authority records
//!
//! An `EntityRecord` is what an authority service hands back for one
//! reference. It lives only long enough to be merged into a document header.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Parse the `"<lat> <long>"` text form used in TEI `geo` elements
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let latitude = parts.next()?.parse().ok()?;
        let longitude = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(latitude, longitude))
    }

    /// The `"<lat> <long>"` text form
    pub fn to_tei_text(&self) -> String {
        format!("{} {}", self.latitude, self.longitude)
    }
}

/// An alternate URL for an entity, typed by the authority it points to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
}

/// The normalized result of one authority lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
    /// Link type to URL, in authority order
    #[serde(default)]
    pub urls: Vec<Link>,
    #[serde(default)]
    pub notes: Vec<String>,
    /// The key the record was fetched with: an external URL or a local `#anchor`
    #[serde(default)]
    pub reference: String,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geo: None,
            urls: Vec::new(),
            notes: Vec::new(),
            reference: reference.into(),
        }
    }

    pub fn with_geo(mut self, latitude: f64, longitude: f64) -> Self {
        self.geo = Some(GeoPoint::new(latitude, longitude));
        self
    }

    pub fn with_link(mut self, kind: impl Into<String>, target: impl Into<String>) -> Self {
        self.urls.push(Link {
            kind: kind.into(),
            target: target.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// True if the reference is a document-local anchor (`#doc_n`)
    pub fn is_local_anchor(&self) -> bool {
        self.reference.starts_with('#')
    }

    /// The anchor without its leading `#`, for local references
    pub fn anchor_id(&self) -> Option<&str> {
        self.reference.strip_prefix('#').filter(|id| !id.is_empty())
    }

    /// Every identifier this record is known by: its reference and its link targets
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.reference.as_str())
            .filter(|r| !r.is_empty())
            .chain(self.urls.iter().map(|l| l.target.as_str()))
    }

    /// Whether two records describe the same resolved entity.
    ///
    /// Names must match exactly. If both sides carry identifiers they must
    /// share at least one; a side with no identifiers matches on name alone.
    pub fn same_entity(&self, other: &EntityRecord) -> bool {
        if self.name.trim() != other.name.trim() {
            return false;
        }
        let mine: Vec<&str> = self.identities().collect();
        let mut theirs = other.identities().peekable();
        if mine.is_empty() || theirs.peek().is_none() {
            return true;
        }
        theirs.any(|id| mine.contains(&id))
    }
}

/// Entities already present in one header list, used for dedup
#[derive(Debug, Clone, Default)]
pub struct ExistingEntities {
    entries: Vec<EntityRecord>,
}

impl ExistingEntities {
    pub fn new(entries: Vec<EntityRecord>) -> Self {
        Self { entries }
    }

    pub fn contains(&self, record: &EntityRecord) -> bool {
        self.entries.iter().any(|e| e.same_entity(record))
    }

    /// Remember a record merged during the current run
    pub fn insert(&mut self, record: EntityRecord) {
        self.entries.push(record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_text_form() {
        let geo = GeoPoint::new(48.85341, 2.3488);
        assert_eq!(geo.to_tei_text(), "48.85341 2.3488");
        assert_eq!(GeoPoint::parse(" 48.85341  2.3488 "), Some(geo));
        assert_eq!(GeoPoint::parse("48.8"), None);
        assert_eq!(GeoPoint::parse("north east"), None);
    }

    #[test]
    fn test_anchor_id() {
        let local = EntityRecord::new("Jane Doe", "#doc1_1");
        assert!(local.is_local_anchor());
        assert_eq!(local.anchor_id(), Some("doc1_1"));

        let external = EntityRecord::new("Paris", "http://sws.geonames.org/2988507/");
        assert!(!external.is_local_anchor());
        assert_eq!(external.anchor_id(), None);
    }

    #[test]
    fn test_same_entity_requires_shared_identity() {
        let a = EntityRecord::new("Jane Doe", "#doc1_1");
        let b = EntityRecord::new("Jane Doe", "#doc1_2");
        let c = EntityRecord::new("Jane Doe", "#doc1_1");
        assert!(!a.same_entity(&b));
        assert!(a.same_entity(&c));
    }

    #[test]
    fn test_same_entity_matches_through_links() {
        let header = EntityRecord::new("Paris", "").with_link("geonames", "http://sws.geonames.org/2988507/");
        let fetched = EntityRecord::new("Paris", "http://sws.geonames.org/2988507/");
        assert!(header.same_entity(&fetched));
    }

    #[test]
    fn test_same_entity_without_identity_matches_on_name() {
        let header = EntityRecord::new("Paris", "");
        assert!(header.same_entity(&EntityRecord::new("Paris", "http://example.org/paris")));
        assert!(!header.same_entity(&EntityRecord::new("Lyon", "http://example.org/lyon")));
    }

    #[test]
    fn test_existing_entities_tracks_inserted_records() {
        let mut existing = ExistingEntities::default();
        let record = EntityRecord::new("Vienna", "http://example.org/vienna");
        assert!(!existing.contains(&record));
        existing.insert(record.clone());
        assert!(existing.contains(&record));
        assert_eq!(existing.len(), 1);
    }
}
