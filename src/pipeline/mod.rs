//! Pipeline stages for docs-to-PDF conversion.
//!
//! Each submodule implements exactly one step of the per-page pipeline.
//!
//! ## Data Flow
//!
//! ```text
//! page.md ──▶ rewrite ──▶ render ──────────────▶ merge ──▶ workspace
//!            (../ imgs)  (grip → wkhtmltopdf)   (lopdf)   (cleanup)
//! ```
//!
//! 1. [`rewrite`]   — make root-relative image targets parent-relative
//! 2. [`render`]    — markdown → HTML → PDF through a [`render::PageRenderer`]
//! 3. [`merge`]     — append the page PDF to the accumulating output document
//! 4. [`workspace`] — resolve page paths against the docs directory and own
//!    the per-page intermediate files until they are removed

pub mod merge;
pub mod render;
pub mod rewrite;
pub mod workspace;
