//! # Renderers
//!
//! Turn an [`InvoiceDocument`] into printable or exportable output.
//!
//! ## Print Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Render Then Spool                                    │
//! │                                                                         │
//! │  renderer.render(&document)                                            │
//! │       │  layout runs on the blocking pool                               │
//! │       ▼                                                                 │
//! │  RenderJob ──── oneshot ────► ready().await                             │
//! │                                   │                                     │
//! │                     Err ◄─────────┤ layout failed / job dropped         │
//! │                                   │                                     │
//! │                                   ▼ Ok(RenderedDocument)                │
//! │                           spooler.submit(&rendered)                     │
//! │                                                                         │
//! │  The spooler is never handed a half-built document: it only runs       │
//! │  after the readiness signal arrives.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Renderers read the pre-formatted figures on the document and never do
//! arithmetic of their own.

pub mod csv;
pub mod html;
pub mod text;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info};

use kirana_core::InvoiceDocument;

pub use self::csv::CsvExportRenderer;
pub use self::html::HtmlPrintRenderer;
pub use self::text::TextReceiptRenderer;

// =============================================================================
// Errors
// =============================================================================

/// Print and export failures.
///
/// None of these roll back a saved invoice.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer could not lay out the document.
    #[error("{renderer} renderer failed: {reason}")]
    Layout {
        renderer: &'static str,
        reason: String,
    },

    /// The render job went away without signalling.
    #[error("{renderer} renderer stopped before the document was ready")]
    Aborted { renderer: &'static str },

    /// The spooled file could not be written.
    #[error("Could not write {}: {source}", .path.display())]
    Spool {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    pub(crate) fn layout(renderer: &'static str, reason: impl Into<String>) -> Self {
        RenderError::Layout {
            renderer,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Rendered Output
// =============================================================================

/// A fully laid-out document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub renderer: &'static str,
    pub invoice_number: String,
    pub file_name: String,
    pub media_type: &'static str,
    pub body: String,
}

/// File name shared by every format: `Invoice_<number>.<extension>`.
pub(crate) fn file_name(document: &InvoiceDocument, extension: &str) -> String {
    format!("Invoice_{}.{}", document.meta.invoice_number, extension)
}

/// A render in progress.
///
/// Resolves once the renderer signals that layout is complete.
#[derive(Debug)]
pub struct RenderJob {
    renderer: &'static str,
    ready: oneshot::Receiver<Result<RenderedDocument, RenderError>>,
}

impl RenderJob {
    /// Runs `layout` on the blocking pool and signals when it finishes.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn spawn<F>(renderer: &'static str, layout: F) -> Self
    where
        F: FnOnce() -> Result<RenderedDocument, RenderError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            // Receiver gone means nobody waits for this render.
            let _ = tx.send(layout());
        });

        RenderJob {
            renderer,
            ready: rx,
        }
    }

    /// Builds a job from an existing channel. The sender is the readiness
    /// signal.
    pub fn from_channel(
        renderer: &'static str,
        ready: oneshot::Receiver<Result<RenderedDocument, RenderError>>,
    ) -> Self {
        RenderJob { renderer, ready }
    }

    pub fn renderer(&self) -> &'static str {
        self.renderer
    }

    /// Waits for the readiness signal.
    pub async fn ready(self) -> Result<RenderedDocument, RenderError> {
        match self.ready.await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Aborted {
                renderer: self.renderer,
            }),
        }
    }
}

/// Lays out an [`InvoiceDocument`] in one output format.
pub trait Renderer: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Starts rendering. The returned job resolves when the output is
    /// complete.
    fn render(&self, document: &InvoiceDocument) -> RenderJob;
}

// =============================================================================
// Spooling
// =============================================================================

/// Where a rendered document ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpoolReceipt {
    pub renderer: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Hands rendered documents to the platform print or save facility.
#[async_trait]
pub trait PrintSpooler: Send + Sync {
    async fn submit(&self, document: &RenderedDocument) -> Result<SpoolReceipt, RenderError>;
}

/// Writes each document as a file into one directory.
///
/// A print daemon watching the directory picks up print jobs; the export
/// directory is simply where exported files land.
#[derive(Debug, Clone)]
pub struct DirectorySpooler {
    dir: PathBuf,
}

impl DirectorySpooler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySpooler { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl PrintSpooler for DirectorySpooler {
    async fn submit(&self, document: &RenderedDocument) -> Result<SpoolReceipt, RenderError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| RenderError::Spool {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(&document.file_name);
        debug!(path = %path.display(), "Spooling document");

        tokio::fs::write(&path, document.body.as_bytes())
            .await
            .map_err(|source| RenderError::Spool {
                path: path.clone(),
                source,
            })?;

        info!(
            invoice_number = %document.invoice_number,
            renderer = document.renderer,
            path = %path.display(),
            "Document spooled"
        );

        Ok(SpoolReceipt {
            renderer: document.renderer.to_string(),
            path,
            bytes: document.body.len(),
        })
    }
}

/// Renders, waits for readiness, then spools.
pub async fn render_and_spool(
    renderer: &dyn Renderer,
    spooler: &dyn PrintSpooler,
    document: &InvoiceDocument,
) -> Result<SpoolReceipt, RenderError> {
    let rendered = renderer.render(document).ready().await?;
    spooler.submit(&rendered).await
}

/// Export formats offered by the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Html,
    Text,
}

impl ExportFormat {
    pub fn renderer(self, receipt_width: usize) -> Box<dyn Renderer> {
        match self {
            ExportFormat::Csv => Box::new(CsvExportRenderer),
            ExportFormat::Html => Box::new(HtmlPrintRenderer),
            ExportFormat::Text => Box::new(TextReceiptRenderer::new(receipt_width)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
