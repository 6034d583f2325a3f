//! Result types returned by the conversion entry points.

use crate::error::PageError;
use crate::site::PageEntry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of a full conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the merged PDF was written.
    pub output_path: PathBuf,
    /// One entry per page in the site configuration, in configuration order.
    pub pages: Vec<PageResult>,
    /// Run totals.
    pub stats: ConversionStats,
}

/// Outcome for one documentation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed position in the page list.
    pub page_num: usize,
    /// Page path as listed in the site configuration.
    pub source: PathBuf,
    /// Title from the site configuration, if any.
    pub title: Option<String>,
    /// PDF pages this page contributed. Zero when it failed.
    pub pdf_pages: usize,
    /// 1-indexed output page where this page starts, if it contributed any.
    pub first_output_page: Option<usize>,
    /// Wall-clock time spent on this page.
    pub duration_ms: u64,
    /// Set when the page was skipped because of an error.
    pub error: Option<PageError>,
}

impl PageResult {
    pub(crate) fn pending(page_num: usize, entry: &PageEntry) -> Self {
        Self {
            page_num,
            source: entry.path.clone(),
            title: entry.title.clone(),
            pdf_pages: 0,
            first_output_page: None,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals for a conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages listed in the site configuration.
    pub total_pages: usize,
    /// Pages merged into the output.
    pub merged_pages: usize,
    /// Pages skipped because they failed.
    pub failed_pages: usize,
    /// Pages in the merged PDF.
    pub output_page_count: usize,
    /// Time spent in the external renderers.
    pub render_duration_ms: u64,
    /// Time spent loading and appending page PDFs.
    pub merge_duration_ms: u64,
    /// Wall-clock time for the whole run, including the final write.
    pub total_duration_ms: u64,
}

/// Site configuration summary produced by [`crate::convert::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSummary {
    /// The site configuration file that was read.
    pub site_config: PathBuf,
    /// `site_name`, if set.
    pub site_name: Option<String>,
    /// Resolved documentation directory.
    pub docs_dir: PathBuf,
    /// Pages in configuration order.
    pub pages: Vec<PageSummary>,
}

/// One page of a [`SiteSummary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed position in the page list.
    pub page_num: usize,
    /// Page path as listed in the site configuration.
    pub path: PathBuf,
    /// Title from the site configuration, if any.
    pub title: Option<String>,
    /// Whether the source file exists under the documentation directory.
    pub exists: bool,
}
