//! Vocabulary categories and their header shapes
//!
//! Each category ties a body mention tag to the header list it is
//! normalized into and the authority operation that resolves it. Adding a
//! category means adding a variant and its row in [`Category::spec`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fetch::FetchOperation;

/// The tagged-mention vocabularies the enhancer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Term,
    Organization,
    Person,
    Place,
}

/// Tag names and fetch operation for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    /// Header list container, e.g. `listPlace`
    pub list_tag: &'static str,
    /// Header item, e.g. `place`
    pub item_tag: &'static str,
    /// Name field inside the item, e.g. `placeName`
    pub name_tag: &'static str,
    /// Mention element in the creation zone and body
    pub mention_tag: &'static str,
    pub operation: FetchOperation,
}

impl Category {
    /// All categories in processing order
    pub const ALL: [Category; 4] = [
        Category::Term,
        Category::Organization,
        Category::Person,
        Category::Place,
    ];

    pub const fn spec(self) -> TypeSpec {
        match self {
            Category::Term => TypeSpec {
                list_tag: "list",
                item_tag: "item",
                name_tag: "name",
                mention_tag: "term",
                operation: FetchOperation::Concepts,
            },
            Category::Organization => TypeSpec {
                list_tag: "listOrg",
                item_tag: "org",
                name_tag: "orgName",
                mention_tag: "orgName",
                operation: FetchOperation::HistoricalAgents,
            },
            Category::Person => TypeSpec {
                list_tag: "listPerson",
                item_tag: "person",
                name_tag: "persName",
                mention_tag: "persName",
                operation: FetchOperation::HistoricalAgents,
            },
            Category::Place => TypeSpec {
                list_tag: "listPlace",
                item_tag: "place",
                name_tag: "placeName",
                mention_tag: "placeName",
                operation: FetchOperation::Places,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Term => "term",
            Category::Organization => "organization",
            Category::Person => "person",
            Category::Place => "place",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
