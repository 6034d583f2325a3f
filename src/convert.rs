//! Conversion entry points.
//!
//! A run is strictly sequential: pages are processed one at a time in
//! site-configuration order, each through
//! `read → rewrite → render-html → render-pdf → merge → cleanup`, and the
//! merged PDF is written once at the end. The external renderers block, so
//! the async [`convert`] moves the whole run onto Tokio's blocking pool;
//! [`convert_sync`] runs it on the caller's thread.

use crate::config::ConversionConfig;
use crate::error::{Docs2PdfError, PageError, PageStep};
use crate::output::{ConversionOutput, ConversionStats, PageResult, PageSummary, SiteSummary};
use crate::pipeline::merge::MergedDocument;
use crate::pipeline::render::PageRenderer;
use crate::pipeline::rewrite::rewrite_image_paths;
use crate::pipeline::workspace::{DocsRoot, Intermediate};
use crate::site::{PageEntry, SiteConfig};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert the pages listed in the site configuration into one merged PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` once the merged PDF has been written. With
/// `skip_failed_pages`, failed pages are listed in `output.pages` with their
/// error set.
///
/// # Errors
/// - site configuration missing or malformed, docs directory missing
/// - the page list is empty
/// - a page failed (unless `skip_failed_pages`), naming the page and step
/// - every page failed
/// - the output could not be written
pub async fn convert(config: &ConversionConfig) -> Result<ConversionOutput, Docs2PdfError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || convert_blocking(&config))
        .await
        .map_err(|e| Docs2PdfError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Synchronous variant of [`convert`]; blocks the calling thread.
pub fn convert_sync(config: &ConversionConfig) -> Result<ConversionOutput, Docs2PdfError> {
    convert_blocking(config)
}

/// Read the site configuration and resolve the page list without rendering.
///
/// Does not require the renderers to be installed.
pub async fn inspect(config: &ConversionConfig) -> Result<SiteSummary, Docs2PdfError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || inspect_blocking(&config))
        .await
        .map_err(|e| Docs2PdfError::Internal(format!("Inspect task panicked: {}", e)))?
}

fn inspect_blocking(config: &ConversionConfig) -> Result<SiteSummary, Docs2PdfError> {
    let site = SiteConfig::load(&config.site_config)?;
    let docs_dir = site.resolve_docs_dir(&config.site_config, config.docs_dir.as_deref());

    let pages = site
        .pages
        .iter()
        .enumerate()
        .map(|(i, entry)| PageSummary {
            page_num: i + 1,
            path: entry.path.clone(),
            title: entry.title.clone(),
            exists: docs_dir.join(&entry.path).is_file(),
        })
        .collect();

    Ok(SiteSummary {
        site_config: config.site_config.clone(),
        site_name: site.site_name,
        docs_dir,
        pages,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

#[derive(Default)]
struct StageTimings {
    render_ms: u64,
    merge_ms: u64,
}

fn convert_blocking(config: &ConversionConfig) -> Result<ConversionOutput, Docs2PdfError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", config.site_config.display());

    // ── Step 1: Load the page list ───────────────────────────────────────
    let site = SiteConfig::load(&config.site_config)?;
    let docs = DocsRoot::open(site.resolve_docs_dir(&config.site_config, config.docs_dir.as_deref()))?;
    if site.pages.is_empty() {
        return Err(Docs2PdfError::NoPages {
            path: config.site_config.clone(),
        });
    }
    let total = site.pages.len();
    info!("{} pages listed, sources in {}", total, docs.path().display());

    let renderer = config.page_renderer();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    // ── Step 2: Render and merge each page in order ──────────────────────
    let mut merged = MergedDocument::new();
    if let Some(ref name) = site.site_name {
        merged.set_title(name.as_str());
    }
    let mut timings = StageTimings::default();
    let mut pages: Vec<PageResult> = Vec::with_capacity(total);

    for (i, entry) in site.pages.iter().enumerate() {
        let page_num = i + 1;
        let page_start = Instant::now();
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total, &entry.path);
        }

        let mut result = PageResult::pending(page_num, entry);
        let first_output_page = merged.page_count() + 1;
        let outcome = process_page(
            page_num,
            entry,
            &docs,
            renderer.as_ref(),
            &mut merged,
            config.keep_intermediates,
            &mut timings,
        );

        match outcome {
            Ok(pdf_pages) => {
                result.pdf_pages = pdf_pages;
                result.first_output_page = (pdf_pages > 0).then_some(first_output_page);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total, pdf_pages);
                }
            }
            Err(error) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total, &error.to_string());
                }
                // A cleanup failure happens after the page was merged, so it
                // cannot be skipped.
                if !config.skip_failed_pages || error.step == PageStep::Cleanup {
                    return Err(Docs2PdfError::PageFailed { total, error });
                }
                warn!("Skipping page {}/{}: {}", page_num, total, error);
                result.error = Some(error);
            }
        }

        result.duration_ms = page_start.elapsed().as_millis() as u64;
        pages.push(result);
    }

    // ── Step 3: Write the merged document ────────────────────────────────
    let merged_pages = pages.iter().filter(|p| p.is_ok()).count();
    if merged_pages == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Docs2PdfError::AllPagesFailed { total, first_error });
    }

    let output_page_count = merged.page_count();
    write_output(merged, &config.output)?;

    let stats = ConversionStats {
        total_pages: total,
        merged_pages,
        failed_pages: total - merged_pages,
        output_page_count,
        render_duration_ms: timings.render_ms,
        merge_duration_ms: timings.merge_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages merged, {} PDF pages → {} ({}ms)",
        merged_pages,
        total,
        output_page_count,
        config.output.display(),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, merged_pages);
    }

    Ok(ConversionOutput {
        output_path: config.output.clone(),
        pages,
        stats,
    })
}

/// Run one page through the pipeline and append it to `merged`.
///
/// Returns the number of PDF pages appended. Intermediates are removed on
/// every path out of this function unless `keep_intermediates` is set.
fn process_page(
    page_num: usize,
    entry: &PageEntry,
    docs: &DocsRoot,
    renderer: &dyn PageRenderer,
    merged: &mut MergedDocument,
    keep_intermediates: bool,
    timings: &mut StageTimings,
) -> Result<usize, PageError> {
    let fail = |step: PageStep, detail: &dyn fmt::Display| {
        PageError::new(page_num, entry.path.clone(), step, detail)
    };

    let source = docs.resolve(&entry.path);
    let original = std::fs::read_to_string(&source).map_err(|e| fail(PageStep::Read, &e))?;
    let rewritten = rewrite_image_paths(&original);

    let mut files = docs.intermediates(&entry.path, keep_intermediates);
    std::fs::write(&files.markdown, rewritten.as_bytes())
        .map_err(|e| fail(PageStep::Write, &e))?;
    files.mark_created(Intermediate::Markdown);
    debug!("Page {}: wrote {}", page_num, files.markdown.display());

    let render_start = Instant::now();
    renderer
        .render_html(&files.markdown, &files.html)
        .map_err(|e| fail(PageStep::RenderHtml, &e))?;
    files.mark_created(Intermediate::Html);
    renderer
        .render_pdf(&files.html, &files.pdf)
        .map_err(|e| fail(PageStep::RenderPdf, &e))?;
    files.mark_created(Intermediate::Pdf);
    timings.render_ms += render_start.elapsed().as_millis() as u64;

    let merge_start = Instant::now();
    let appended = merged
        .append_file(&files.pdf)
        .map_err(|e| fail(PageStep::Merge, &e))?;
    timings.merge_ms += merge_start.elapsed().as_millis() as u64;
    if appended == 0 {
        warn!("Page {} ({}) rendered to an empty PDF", page_num, entry.path.display());
    }

    files.cleanup().map_err(|e| fail(PageStep::Cleanup, &e))?;
    debug!("Page {}: merged {} PDF pages", page_num, appended);
    Ok(appended)
}

/// Serialise the merged document and write it atomically (temp file + rename).
fn write_output(merged: MergedDocument, path: &Path) -> Result<(), Docs2PdfError> {
    let write_err = |detail: String| Docs2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let bytes = merged.to_bytes().map_err(|e| write_err(e.to_string()))?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| write_err(e.to_string()))?;
    tmp.write_all(&bytes).map_err(|e| write_err(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_err(e.error.to_string()))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
