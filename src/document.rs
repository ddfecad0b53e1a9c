//! TEI document view
//!
//! `TeiDocument` owns the parsed tree for one enhancement run and answers
//! the structural questions the enhancer asks of it: what the document is
//! called, which entities its header already lists, and where mentions may
//! appear. All reads are pure tree inspection.

use std::path::Path;

use crate::category::TypeSpec;
use crate::entity::{EntityRecord, ExistingEntities, GeoPoint, Link};
use crate::error::{EnhanceError, Result};
use crate::xml::{Element, XmlTree, XML_ID};

const CREATION_PATH: &[&str] = &["teiHeader", "profileDesc", "creation"];
const BODY_PATH: &[&str] = &["text", "body"];

/// A parsed TEI document
#[derive(Debug, Clone)]
pub struct TeiDocument {
    tree: XmlTree,
}

impl TeiDocument {
    /// Wrap an already parsed tree; the root must be `TEI` in the TEI namespace
    pub fn from_tree(tree: XmlTree) -> Result<Self> {
        if !tree.root().is_tei("TEI") {
            return Err(EnhanceError::NotTei {
                root: tree.root().name().to_string(),
            });
        }
        Ok(Self { tree })
    }

    pub fn from_xml_str(xml: &str) -> Result<Self> {
        Self::from_tree(XmlTree::parse(xml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| EnhanceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml_str(&xml)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        Ok(self.tree.to_xml_string()?)
    }

    pub fn root(&self) -> &Element {
        self.tree.root()
    }

    pub fn root_mut(&mut self) -> &mut Element {
        self.tree.root_mut()
    }

    /// The document's unique identifier.
    ///
    /// Taken from `teiHeader/profileDesc/creation/idno` if it has text,
    /// otherwise from `xml:id` on the root.
    pub fn document_id(&self) -> Result<String> {
        let from_idno = self
            .root()
            .find_path(CREATION_PATH)
            .and_then(|creation| creation.first_child("idno"))
            .map(|idno| idno.text().trim().to_string())
            .filter(|id| !id.is_empty());
        if let Some(id) = from_idno {
            return Ok(id);
        }

        self.root()
            .attr(XML_ID)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(EnhanceError::MissingIdentifier)
    }

    pub fn has_header(&self) -> bool {
        self.root().first_child("teiHeader").is_some()
    }

    /// `teiHeader/fileDesc/sourceDesc`, creating the last two if absent
    pub fn source_desc_mut(&mut self) -> Result<&mut Element> {
        let header = self
            .root_mut()
            .first_child_mut("teiHeader")
            .ok_or(EnhanceError::MissingElement("teiHeader"))?;
        Ok(header.child_or_insert("fileDesc").child_or_insert("sourceDesc"))
    }

    /// Entities already listed under the header list for `spec`.
    ///
    /// An entry's reference is `#<xml:id>` when it has one, otherwise its
    /// first link target, otherwise empty.
    pub fn existing_entities(&self, spec: &TypeSpec) -> ExistingEntities {
        let Some(source) = self
            .root()
            .find_path(&["teiHeader", "fileDesc", "sourceDesc"])
        else {
            return ExistingEntities::default();
        };

        let entries = source
            .child_elements()
            .filter(|list| list.is_tei(spec.list_tag))
            .flat_map(|list| list.child_elements())
            .filter(|item| item.is_tei(spec.item_tag))
            .map(|item| header_entry(item, spec))
            .collect();
        ExistingEntities::new(entries)
    }

    /// Highest `n` among `#<document_id>_<n>` pointers in any `ref` and
    /// `<document_id>_<n>` values of any `xml:id`, or 0 if there are none
    pub fn highest_anchor_index(&self, document_id: &str) -> u64 {
        let prefix = format!("{document_id}_");
        let index = |id: &str| -> Option<u64> { id.strip_prefix(prefix.as_str())?.parse().ok() };

        let mut highest = 0;
        self.root().walk(&mut |element: &Element| {
            let from_refs = element
                .attr("ref")
                .into_iter()
                .flat_map(str::split_whitespace)
                .filter_map(|pointer| pointer.strip_prefix('#'))
                .filter_map(index);
            let from_id = element.attr(XML_ID).map(str::trim).and_then(index);
            for n in from_refs.chain(from_id) {
                highest = highest.max(n);
            }
        });
        highest
    }

    /// True if any element in the document carries `xml:id == id`
    pub fn has_xml_id(&self, id: &str) -> bool {
        self.root().has_xml_id(id)
    }

    /// Visit every mention element named `tag` in the creation zone and the
    /// body, in that order.
    ///
    /// In the body only elements nested below a child of `body` count, so a
    /// bare mention directly under `body` is ignored.
    pub fn for_each_mention_mut<F>(&mut self, tag: &str, mut f: F)
    where
        F: FnMut(&mut Element),
    {
        if let Some(creation) = self.root_mut().find_path_mut(CREATION_PATH) {
            creation.for_each_descendant_mut(tag, &mut f);
        }
        if let Some(body) = self.root_mut().find_path_mut(BODY_PATH) {
            for block in body.child_elements_mut() {
                block.for_each_descendant_mut(tag, &mut f);
            }
        }
    }
}

fn header_entry(item: &Element, spec: &TypeSpec) -> EntityRecord {
    let name = item
        .first_child(spec.name_tag)
        .map(|n| n.text().trim().to_string())
        .unwrap_or_default();
    let geo = item
        .find_path(&["location", "geo"])
        .and_then(|geo| GeoPoint::parse(&geo.text()));
    let urls: Vec<Link> = item
        .first_child("linkGrp")
        .map(|group| {
            group
                .child_elements()
                .filter(|link| link.is_tei("link"))
                .filter_map(|link| {
                    Some(Link {
                        kind: link.attr("type").unwrap_or_default().to_string(),
                        target: link.attr("target")?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    let notes = item
        .first_child("note")
        .map(|note| {
            note.child_elements()
                .filter(|p| p.is_tei("p"))
                .map(|p| p.text())
                .collect()
        })
        .unwrap_or_default();
    let reference = match item.attr(XML_ID) {
        Some(id) if !id.is_empty() => format!("#{id}"),
        _ => urls.first().map(|l| l.target.clone()).unwrap_or_default(),
    };

    EntityRecord {
        name,
        geo,
        urls,
        notes,
        reference,
    }
}
