//! # edgequake-docs2pdf
//!
//! Merge the pages of an mkdocs-style documentation site into a single PDF.
//!
//! The page list comes from the site configuration (`mkdocs.yml`). Each page
//! is rendered on its own by two external tools, `grip` (markdown → HTML) and
//! `wkhtmltopdf` (HTML → PDF), and the per-page PDFs are concatenated in
//! page-list order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! mkdocs.yml
//!  │
//!  ├─ 1. Site     ordered page list (pages / nav, nested sections flattened)
//!  ├─ 2. Rewrite  ![alt](/img.png) → ![alt](../img.png)
//!  ├─ 3. Render   <page>.temp → <page>.temp.html → <page>.pdf
//!  ├─ 4. Merge    append page PDF to the output document (lopdf)
//!  ├─ 5. Cleanup  remove the three intermediates
//!  └─ 6. Output   merged PDF written once, atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docs2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .site_config("mkdocs.yml")
//!         .output("manual.pdf")
//!         .build()?;
//!     let output = convert(&config).await?;
//!     eprintln!(
//!         "{} pages → {} PDF pages",
//!         output.stats.merged_pages, output.stats.output_page_count
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docs2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod site;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, inspect};
pub use error::{Docs2PdfError, PageError, PageStep, RenderError};
pub use output::{ConversionOutput, ConversionStats, PageResult, PageSummary, SiteSummary};
pub use pipeline::merge::MergedDocument;
pub use pipeline::render::{ExternalRenderer, PageRenderer, ToolCommand};
pub use pipeline::rewrite::rewrite_image_paths;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use site::{PageEntry, SiteConfig};
