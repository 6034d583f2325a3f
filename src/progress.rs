//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each documentation page.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docs2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pdf_pages: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for PageCounter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, pdf_pages: usize) {
//!         self.pdf_pages.fetch_add(pdf_pages, Ordering::SeqCst);
//!         eprintln!("Page {}/{} merged ({} PDF pages)", page_num, total_pages, pdf_pages);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pdf_pages: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// Pages are processed one at a time, in site-configuration order, on a
/// blocking worker thread; implementations must be `Send + Sync`. All
/// methods have default no-op implementations so callers only override what
/// they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first page is processed.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages listed in the site configuration
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is read.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed position in the page list
    /// * `total_pages` — number of pages in the list
    /// * `source`      — page path as listed in the site configuration
    fn on_page_start(&self, page_num: usize, total_pages: usize, source: &Path) {
        let _ = (page_num, total_pages, source);
    }

    /// Called after a page has been merged and its intermediates removed.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed position in the page list
    /// * `total_pages` — number of pages in the list
    /// * `pdf_pages`   — PDF pages this page contributed to the output
    fn on_page_complete(&self, page_num: usize, total_pages: usize, pdf_pages: usize) {
        let _ = (page_num, total_pages, pdf_pages);
    }

    /// Called when a page fails.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed position in the page list
    /// * `total_pages` — number of pages in the list
    /// * `error`       — human-readable error description
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after all pages have been attempted and the output written.
    ///
    /// # Arguments
    /// * `total_pages`   — number of pages in the list
    /// * `success_count` — pages merged without error
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
