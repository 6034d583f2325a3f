//! Error types for the edgequake-docs2pdf library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`Docs2PdfError`] — **Fatal**: the run cannot produce an output PDF
//!   (missing site configuration, malformed YAML, unwritable output, or a
//!   page failure while running in fail-fast mode). Returned as
//!   `Err(Docs2PdfError)` from the top-level `convert*` functions.
//!
//! * [`PageError`] — **Per page**: one documentation page failed at a known
//!   [`PageStep`]. In fail-fast mode it is wrapped in
//!   [`Docs2PdfError::PageFailed`]; with `skip_failed_pages` it is stored in
//!   [`crate::output::PageResult`] and the run continues.
//!
//! * [`RenderError`] — **Per tool invocation**: an external renderer could
//!   not be spawned, exited non-zero, or did not produce its output file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docs2pdf library.
#[derive(Debug, Error)]
pub enum Docs2PdfError {
    // ── Site configuration errors ─────────────────────────────────────────
    /// The site configuration file does not exist.
    #[error("Site configuration not found: '{path}'\nRun from the directory containing mkdocs.yml or pass --config.")]
    ConfigNotFound { path: PathBuf },

    /// The site configuration exists but could not be read.
    #[error("Failed to read site configuration '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The site configuration is not valid YAML.
    #[error("Site configuration '{path}' is not valid YAML: {detail}")]
    InvalidYaml { path: PathBuf, detail: String },

    /// Neither a `pages` nor a `nav` list was found.
    #[error("Site configuration '{path}' has no 'pages' (or 'nav') list")]
    MissingPages { path: PathBuf },

    /// A page entry has an unsupported shape.
    #[error("Page entry #{index} in '{path}' is not a path, [path, title] pair, or 'Title: path' mapping: {detail}")]
    InvalidPageEntry {
        path: PathBuf,
        index: usize,
        detail: String,
    },

    /// The documentation directory does not exist.
    #[error("Documentation directory not found: '{path}'\nSet docs_dir in the site configuration or pass --docs-dir.")]
    DocsDirNotFound { path: PathBuf },

    /// The page list resolved to zero entries.
    #[error("Site configuration '{path}' lists no pages; nothing to merge")]
    NoPages { path: PathBuf },

    // ── Page errors ───────────────────────────────────────────────────────
    /// A page failed and `skip_failed_pages` is off.
    #[error("Page {} of {total} failed: {error}", .error.page_num)]
    PageFailed { total: usize, error: PageError },

    /// Every page failed while `skip_failed_pages` was on.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the merged PDF.
    #[error("Failed to write output file '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The pipeline step at which a page failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageStep {
    /// Reading the markdown source.
    Read,
    /// Writing the rewritten markdown next to the source.
    Write,
    /// Running the markdown-to-HTML renderer.
    RenderHtml,
    /// Running the HTML-to-PDF renderer.
    RenderPdf,
    /// Loading the page PDF and appending it to the output.
    Merge,
    /// Deleting the page's intermediate files.
    Cleanup,
}

impl fmt::Display for PageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PageStep::Read => "read",
            PageStep::Write => "write",
            PageStep::RenderHtml => "render-html",
            PageStep::RenderPdf => "render-pdf",
            PageStep::Merge => "merge",
            PageStep::Cleanup => "cleanup",
        };
        f.write_str(s)
    }
}

/// A failure of a single documentation page, tagged with where it happened.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("'{}' failed at {step}: {detail}", .source_path.display())]
pub struct PageError {
    /// 1-indexed position of the page in the site configuration.
    pub page_num: usize,
    /// Page path as listed in the site configuration.
    pub source_path: PathBuf,
    /// Step that failed.
    pub step: PageStep,
    /// Human-readable cause.
    pub detail: String,
}

impl PageError {
    pub fn new(
        page_num: usize,
        source_path: impl Into<PathBuf>,
        step: PageStep,
        detail: impl fmt::Display,
    ) -> Self {
        Self {
            page_num,
            source_path: source_path.into(),
            step,
            detail: detail.to_string(),
        }
    }
}

/// Failure of one external renderer invocation.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer executable is not on `PATH`.
    #[error("renderer '{program}' not found on PATH")]
    ToolNotFound { program: String },

    /// The renderer could not be started for another reason.
    #[error("failed to start '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran but reported failure.
    #[error("'{program}' exited with {status}{}", format_stderr(.stderr))]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },

    /// The renderer exited successfully but wrote nothing.
    #[error("'{program}' did not produce '{}'", .output.display())]
    MissingOutput { program: String, output: PathBuf },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
