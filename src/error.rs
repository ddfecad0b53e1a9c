//! Error types for document enhancement
//!
//! Only structural problems surface as errors. Per-category fetch failures,
//! malformed mentions and identifier collisions are recovered where they
//! happen and show up in the [`EnhanceReport`](crate::EnhanceReport) instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::xml::XmlError;

/// Main error type for the enhancer
#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("TEI document must have a unique identifier (creation/idno or xml:id on the root)")]
    MissingIdentifier,

    #[error("TEI document is missing required element {0}")]
    MissingElement(&'static str),

    #[error("expected a TEI root element, found <{root}>")]
    NotTei { root: String },

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EnhanceError>;
