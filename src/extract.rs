//! Reference extraction
//!
//! Collects the references of one mention tag from the creation zone and
//! the body. Mentions without a `ref` get a synthesized local anchor written
//! back onto the element, so a second pass over the same tree sees the same
//! anchors and creates no new ones.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::document::TeiDocument;

/// A reference found on (or assigned to) a mention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A document-local anchor `#<doc>_<n>`, resolvable only by its text
    LocalAnchor { text: String, id: String },
    /// An external authority URL or URI
    ExternalRef { id: String, text: String },
}

impl Reference {
    /// Classify a `ref` value found on a mention
    pub fn from_ref(id: impl Into<String>, text: impl Into<String>) -> Self {
        let id = id.into();
        let text = text.into();
        if id.starts_with('#') {
            Reference::LocalAnchor { text, id }
        } else {
            Reference::ExternalRef { id, text }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Reference::LocalAnchor { id, .. } | Reference::ExternalRef { id, .. } => id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reference::LocalAnchor { text, .. } | Reference::ExternalRef { text, .. } => text,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Reference::LocalAnchor { .. })
    }
}

/// The references of one category, unique by id, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    entries: Vec<Reference>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference; the first occurrence of an id wins
    pub fn insert(&mut self, reference: Reference) -> bool {
        if self.entries.iter().any(|r| r.id() == reference.id()) {
            return false;
        }
        self.entries.push(reference);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.entries.iter()
    }

    pub fn local(&self) -> impl Iterator<Item = &Reference> {
        self.entries.iter().filter(|r| r.is_local())
    }

    pub fn external(&self) -> impl Iterator<Item = &Reference> {
        self.entries.iter().filter(|r| !r.is_local())
    }

    pub fn get(&self, id: &str) -> Option<&Reference> {
        self.entries.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Reference> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = Reference>>(iter: I) -> Self {
        let mut set = ReferenceSet::new();
        for reference in iter {
            set.insert(reference);
        }
        set
    }
}

/// Anchor index shared by every category of one document run
#[derive(Debug, Default)]
pub struct AnchorCounter {
    start: u64,
    value: u64,
}

impl AnchorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter whose first anchor is `n + 1`
    pub fn starting_after(n: u64) -> Self {
        Self { start: n, value: n }
    }

    pub fn next(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    /// The last index handed out, or the starting point if none was
    pub fn current(&self) -> u64 {
        self.value
    }

    /// Number of anchors handed out by this counter
    pub fn created(&self) -> u64 {
        self.value - self.start
    }
}

/// Extracts mention references for one document
pub struct ReferenceExtractor {
    document_id: String,
}

impl ReferenceExtractor {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
        }
    }

    pub fn anchor(&self, n: u64) -> String {
        format!("#{}_{}", self.document_id, n)
    }

    /// A counter that continues after the highest anchor already in the document
    pub fn counter_for(&self, document: &TeiDocument) -> AnchorCounter {
        AnchorCounter::starting_after(document.highest_anchor_index(&self.document_id))
    }

    /// Collect references for every `tag` mention, anchoring unmarked ones.
    ///
    /// Unmarked mentions share one anchor per distinct text, reusing a local
    /// anchor already carried by a mention of the same text. A mention with
    /// neither a `ref` nor any text node is skipped and left as it is.
    pub fn extract(
        &self,
        document: &mut TeiDocument,
        tag: &str,
        counter: &mut AnchorCounter,
    ) -> ReferenceSet {
        let mut references = ReferenceSet::new();
        let mut skipped = 0usize;

        let mut anchors_by_text: HashMap<String, String> = HashMap::new();
        document.for_each_mention_mut(tag, |mention| {
            if let Some(id) = mention.attr("ref").map(str::trim).filter(|r| r.starts_with('#')) {
                anchors_by_text
                    .entry(normalize_space(&mention.text()))
                    .or_insert_with(|| id.to_string());
            }
        });

        document.for_each_mention_mut(tag, |mention| {
            let text = normalize_space(&mention.text());
            let existing = mention
                .attr("ref")
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string);

            match existing {
                Some(id) => {
                    references.insert(Reference::from_ref(id, text));
                }
                None if !mention.has_text_nodes() => {
                    skipped += 1;
                }
                None => {
                    let id = match anchors_by_text.get(&text) {
                        Some(id) => id.clone(),
                        None => {
                            let id = self.anchor(counter.next());
                            debug!(tag, anchor = %id, text = %text, "Assigned local anchor");
                            anchors_by_text.insert(text.clone(), id.clone());
                            id
                        }
                    };
                    mention.set_attr("ref", id.clone());
                    references.insert(Reference::LocalAnchor { text, id });
                }
            }
        });

        if skipped > 0 {
            warn!(
                document_id = %self.document_id,
                tag,
                skipped,
                "Skipped mentions without text or ref"
            );
        }
        references
    }
}

/// Collapse runs of whitespace and trim, as XPath `normalize-space` does
pub fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
