//! Batch enhancement
//!
//! Runs the enhancer over many TEI files. Documents share nothing, so they
//! are processed concurrently up to the configured limit. A failing document
//! is reported and does not affect the others. Cancellation is honoured
//! between documents; a document whose run is interrupted is reported as
//! cancelled with no changes, since runs commit all-or-nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::document::TeiDocument;
use crate::enhancer::{EnhanceReport, Enhancer};
use crate::error::EnhanceError;

/// Result of processing one file
#[derive(Debug)]
pub enum DocumentOutcome {
    Enhanced {
        path: PathBuf,
        document: TeiDocument,
        report: EnhanceReport,
    },
    Failed {
        path: PathBuf,
        document_id: Option<String>,
        message: String,
    },
    /// Not an XML file
    Skipped { path: PathBuf },
    Cancelled { path: PathBuf },
}

impl DocumentOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DocumentOutcome::Enhanced { path, .. }
            | DocumentOutcome::Failed { path, .. }
            | DocumentOutcome::Skipped { path }
            | DocumentOutcome::Cancelled { path } => path,
        }
    }

    pub fn added(&self) -> usize {
        match self {
            DocumentOutcome::Enhanced { report, .. } => report.added(),
            _ => 0,
        }
    }
}

/// Outcomes in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    pub fn total_added(&self) -> usize {
        self.outcomes.iter().map(DocumentOutcome::added).sum()
    }

    pub fn enhanced(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Enhanced { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Cancelled { .. }))
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(*o)).count()
    }
}

/// True if the path names an `.xml` file, ignoring any `?query` suffix
pub fn is_xml_file(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref().to_string_lossy();
    let stem = path.split_once('?').map(|(p, _)| p).unwrap_or(&*path);
    stem.ends_with(".xml")
}

/// Enhances a set of TEI files with bounded concurrency
pub struct BatchEnhancer {
    enhancer: Arc<Enhancer>,
}

impl BatchEnhancer {
    pub fn new(enhancer: Arc<Enhancer>) -> Self {
        Self { enhancer }
    }

    /// Process every path; outcomes come back in input order.
    ///
    /// Enhanced documents are returned, not written: persisting them is up
    /// to the caller.
    pub async fn run(&self, paths: Vec<PathBuf>, cancel: CancellationToken) -> BatchReport {
        let limit = self.enhancer.config().concurrency();
        info!(documents = paths.len(), concurrency = limit, "Starting batch");

        let outcomes: Vec<DocumentOutcome> = stream::iter(paths)
            .map(|path| {
                let cancel = cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return DocumentOutcome::Cancelled { path };
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => DocumentOutcome::Cancelled { path: path.clone() },
                        outcome = self.process(&path) => outcome,
                    }
                }
            })
            .buffered(limit)
            .collect()
            .await;

        let report = BatchReport { outcomes };
        info!(
            enhanced = report.enhanced(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            added = report.total_added(),
            "Batch finished"
        );
        report
    }

    async fn process(&self, path: &Path) -> DocumentOutcome {
        if !is_xml_file(path) {
            return DocumentOutcome::Skipped {
                path: path.to_path_buf(),
            };
        }
        info!(path = %path.display(), "Processing");

        let xml = match tokio::fs::read_to_string(path).await {
            Ok(xml) => xml,
            Err(source) => {
                let e = EnhanceError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                return failed(path, None, e);
            }
        };
        let mut document = match TeiDocument::from_xml_str(&xml) {
            Ok(document) => document,
            Err(e) => return failed(path, None, e),
        };
        match self.enhancer.enhance(&mut document).await {
            Ok(report) => DocumentOutcome::Enhanced {
                path: path.to_path_buf(),
                document,
                report,
            },
            Err(e) => {
                let document_id = document.document_id().ok();
                failed(path, document_id, e)
            }
        }
    }
}

fn failed(path: &Path, document_id: Option<String>, e: impl std::fmt::Display) -> DocumentOutcome {
    error!(path = %path.display(), document_id = ?document_id, error = %e, "Document failed");
    DocumentOutcome::Failed {
        path: path.to_path_buf(),
        document_id,
        message: e.to_string(),
    }
}
