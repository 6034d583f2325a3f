//! Configuration types for docs-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the classic
//! layout: `mkdocs.yml` in the working directory, sources under `Docs/`,
//! `grip` for HTML, `wkhtmltopdf` for PDF, and `output.pdf` as the result.

use crate::error::Docs2PdfError;
use crate::pipeline::render::{ExternalRenderer, PageRenderer, ToolCommand};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docs2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .site_config("site/mkdocs.yml")
///     .output("manual.pdf")
///     .keep_intermediates(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Path to the site configuration file. Default: `mkdocs.yml`.
    pub site_config: PathBuf,

    /// Documentation directory. If None, the site configuration's `docs_dir`
    /// is used, then `Docs`. Relative paths are taken relative to the site
    /// configuration file.
    pub docs_dir: Option<PathBuf>,

    /// Merged PDF destination. Default: `output.pdf`.
    pub output: PathBuf,

    /// Markdown-to-HTML tool. Default: `grip --wide --export {input} {output}`.
    pub html_renderer: ToolCommand,

    /// HTML-to-PDF tool. Default: `wkhtmltopdf -l {input} {output}`.
    pub pdf_renderer: ToolCommand,

    /// Pre-constructed renderer. Takes precedence over `html_renderer` and
    /// `pdf_renderer`.
    pub renderer: Option<Arc<dyn PageRenderer>>,

    /// Leave each page's `.temp`, `.temp.html` and `.pdf` files on disk. Default: false.
    pub keep_intermediates: bool,

    /// Skip pages that fail instead of aborting the run. Default: false.
    ///
    /// Skipped pages are reported in [`crate::output::PageResult::error`];
    /// the run still fails if no page succeeds.
    pub skip_failed_pages: bool,

    /// Optional per-page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            site_config: PathBuf::from("mkdocs.yml"),
            docs_dir: None,
            output: PathBuf::from("output.pdf"),
            html_renderer: ToolCommand::default_html(),
            pdf_renderer: ToolCommand::default_pdf(),
            renderer: None,
            keep_intermediates: false,
            skip_failed_pages: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("site_config", &self.site_config)
            .field("docs_dir", &self.docs_dir)
            .field("output", &self.output)
            .field("html_renderer", &self.html_renderer)
            .field("pdf_renderer", &self.pdf_renderer)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn PageRenderer>"))
            .field("keep_intermediates", &self.keep_intermediates)
            .field("skip_failed_pages", &self.skip_failed_pages)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The renderer this configuration runs pages through.
    pub fn page_renderer(&self) -> Arc<dyn PageRenderer> {
        match self.renderer {
            Some(ref renderer) => Arc::clone(renderer),
            None => Arc::new(ExternalRenderer::new(
                self.html_renderer.clone(),
                self.pdf_renderer.clone(),
            )),
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn site_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.site_config = path.into();
        self
    }

    pub fn docs_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.docs_dir = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    pub fn html_renderer(mut self, cmd: ToolCommand) -> Self {
        self.config.html_renderer = cmd;
        self
    }

    pub fn pdf_renderer(mut self, cmd: ToolCommand) -> Self {
        self.config.pdf_renderer = cmd;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn keep_intermediates(mut self, v: bool) -> Self {
        self.config.keep_intermediates = v;
        self
    }

    pub fn skip_failed_pages(mut self, v: bool) -> Self {
        self.config.skip_failed_pages = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Docs2PdfError> {
        let c = &self.config;
        if c.site_config.as_os_str().is_empty() {
            return Err(Docs2PdfError::InvalidConfig(
                "site configuration path must not be empty".into(),
            ));
        }
        if c.output.as_os_str().is_empty() {
            return Err(Docs2PdfError::InvalidConfig(
                "output path must not be empty".into(),
            ));
        }
        // Tool templates are irrelevant when a renderer is injected.
        if c.renderer.is_none() {
            c.html_renderer
                .validate()
                .map_err(Docs2PdfError::InvalidConfig)?;
            c.pdf_renderer
                .validate()
                .map_err(Docs2PdfError::InvalidConfig)?;
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_layout() {
        let c = ConversionConfig::default();
        assert_eq!(c.site_config, PathBuf::from("mkdocs.yml"));
        assert_eq!(c.output, PathBuf::from("output.pdf"));
        assert_eq!(c.docs_dir, None);
        assert_eq!(c.html_renderer.program, "grip");
        assert_eq!(c.pdf_renderer.program, "wkhtmltopdf");
        assert!(!c.keep_intermediates);
        assert!(!c.skip_failed_pages);
    }

    #[test]
    fn builder_sets_fields() {
        let c = ConversionConfig::builder()
            .site_config("site/mkdocs.yml")
            .docs_dir("docs")
            .output("out/manual.pdf")
            .skip_failed_pages(true)
            .build()
            .unwrap();
        assert_eq!(c.docs_dir, Some(PathBuf::from("docs")));
        assert_eq!(c.output, PathBuf::from("out/manual.pdf"));
        assert!(c.skip_failed_pages);
    }

    #[test]
    fn build_rejects_template_without_output() {
        let err = ConversionConfig::builder()
            .pdf_renderer(ToolCommand::new("wkhtmltopdf", ["{input}"]))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("{output}"), "{err}");
    }

    #[test]
    fn build_rejects_empty_output() {
        assert!(ConversionConfig::builder().output("").build().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let s = format!("{:?}", ConversionConfig::default());
        assert!(s.contains("ConversionConfig"));
        assert!(s.contains("wkhtmltopdf"));
    }
}
