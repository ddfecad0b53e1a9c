//! Header merge
//!
//! Writes resolved records into the category list under
//! `teiHeader/fileDesc/sourceDesc`. A record whose identity is already
//! listed is left alone, so merging is idempotent. Only the header is
//! touched; mention anchors were written during extraction.

use tracing::warn;

use crate::category::TypeSpec;
use crate::document::TeiDocument;
use crate::entity::{EntityRecord, ExistingEntities};
use crate::error::Result;
use crate::xml::XML_ID;

/// What a merge did to the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new item was appended
    Added,
    /// A new item was appended without its `xml:id`, because another
    /// element in the document already uses that id
    AddedWithIdConflict { id: String },
    /// An equivalent item is already listed; nothing changed
    AlreadyPresent,
}

impl MergeOutcome {
    pub fn is_added(&self) -> bool {
        !matches!(self, MergeOutcome::AlreadyPresent)
    }
}

/// Inserts resolved records into header entity lists
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderMerger;

impl HeaderMerger {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        document: &mut TeiDocument,
        spec: &TypeSpec,
        record: &EntityRecord,
        existing: &ExistingEntities,
    ) -> Result<MergeOutcome> {
        if existing.contains(record) {
            return Ok(MergeOutcome::AlreadyPresent);
        }

        // Checked before the item exists so the new item can't collide with itself
        let conflict = record
            .anchor_id()
            .filter(|id| document.has_xml_id(id))
            .map(str::to_string);

        let source = document.source_desc_mut()?;
        let list = source.child_or_insert(spec.list_tag);
        let mut item = list.sibling_kind(spec.item_tag);
        item.push_text_child(spec.name_tag, &record.name);

        if let Some(geo) = &record.geo {
            let location = item.push_element(item.sibling_kind("location"));
            location.push_text_child("geo", &geo.to_tei_text());
        }

        if record.is_local_anchor() {
            if let (Some(id), None) = (record.anchor_id(), &conflict) {
                item.set_attr(XML_ID, id);
            }
        } else if !record.urls.is_empty() {
            let group = item.push_element(item.sibling_kind("linkGrp"));
            for link in &record.urls {
                let entry = group.push_element(group.sibling_kind("link"));
                entry.set_attr("type", link.kind.as_str());
                entry.set_attr("target", link.target.as_str());
            }
        }

        if !record.notes.is_empty() {
            let note = item.push_element(item.sibling_kind("note"));
            for text in &record.notes {
                note.push_text_child("p", text);
            }
        }

        list.push_element(item);

        match conflict {
            Some(id) => {
                warn!(
                    list = spec.list_tag,
                    name = %record.name,
                    xml_id = %id,
                    "xml:id already in use, entry added without identifier"
                );
                Ok(MergeOutcome::AddedWithIdConflict { id })
            }
            None => Ok(MergeOutcome::Added),
        }
    }
}
