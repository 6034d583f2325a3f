//! Documentation directory handle and per-page intermediate files.
//!
//! The process working directory is never changed. Instead every page path
//! is resolved against an explicit [`DocsRoot`], and the three files a page
//! produces on its way to PDF are tracked by an [`Intermediates`] guard.
//!
//! Intermediates are written next to the page source rather than into a temp
//! directory: the HTML renderer resolves the rewritten `../` image paths
//! relative to the file it is given.
//!
//! The guard removes only the files this run produced, recorded through
//! [`Intermediates::mark_created`], so a page that fails half-way through
//! rendering leaves nothing of its own behind and never touches a file that
//! was already there. The success path calls [`Intermediates::cleanup`]
//! instead, which reports removal failures.

use crate::error::Docs2PdfError;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The documentation directory all page paths are relative to.
#[derive(Debug, Clone)]
pub struct DocsRoot {
    dir: PathBuf,
}

impl DocsRoot {
    /// Open an existing documentation directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Docs2PdfError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(Docs2PdfError::DocsDirNotFound { path: dir });
        }
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Resolve a page path from the site configuration.
    pub fn resolve(&self, page: &Path) -> PathBuf {
        self.dir.join(page)
    }

    /// Intermediate file set for a page.
    pub fn intermediates(&self, page: &Path, keep: bool) -> Intermediates {
        Intermediates::for_source(&self.resolve(page), keep)
    }
}

/// The three transient files a page passes through.
#[derive(Debug)]
pub struct Intermediates {
    /// Markdown with image paths rewritten: `<page>.temp`.
    pub markdown: PathBuf,
    /// Rendered HTML: `<page>.temp.html`.
    pub html: PathBuf,
    /// Rendered PDF: the page path with a `.pdf` extension.
    pub pdf: PathBuf,
    created: [bool; 3],
    keep: bool,
    armed: bool,
}

/// One of the three intermediate files of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intermediate {
    Markdown,
    Html,
    Pdf,
}

impl Intermediate {
    fn index(self) -> usize {
        match self {
            Intermediate::Markdown => 0,
            Intermediate::Html => 1,
            Intermediate::Pdf => 2,
        }
    }
}

impl Intermediates {
    /// Derive intermediate paths from the page source path.
    pub fn for_source(source: &Path, keep: bool) -> Self {
        let markdown = append_suffix(source, ".temp");
        let html = append_suffix(&markdown, ".html");
        let mut pdf = source.with_extension("pdf");
        if pdf == source {
            pdf = append_suffix(source, ".pdf");
        }
        Self {
            markdown,
            html,
            pdf,
            created: [false; 3],
            keep,
            armed: true,
        }
    }

    /// All three paths, in creation order.
    pub fn paths(&self) -> [&Path; 3] {
        [&self.markdown, &self.html, &self.pdf]
    }

    /// Record that `file` was written by this run and may be removed.
    pub fn mark_created(&mut self, file: Intermediate) {
        self.created[file.index()] = true;
    }

    /// Delete all three files, failing on the first one that cannot be removed.
    ///
    /// With `keep` set this is a no-op that leaves the files for inspection.
    pub fn cleanup(mut self) -> io::Result<()> {
        self.armed = false;
        if self.keep {
            debug!("Keeping intermediates for {}", self.markdown.display());
            return Ok(());
        }
        for path in self.paths() {
            std::fs::remove_file(path).map_err(|e| {
                io::Error::new(e.kind(), format!("{}: {e}", path.display()))
            })?;
        }
        Ok(())
    }
}

impl Drop for Intermediates {
    fn drop(&mut self) {
        if !self.armed || self.keep {
            return;
        }
        let created = self.created;
        for (path, _) in self.paths().into_iter().zip(created).filter(|(_, c)| *c) {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed leftover {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch_all(files: &Intermediates) {
        for p in files.paths() {
            std::fs::write(p, b"x").unwrap();
        }
    }

    #[test]
    fn names_follow_the_page_path() {
        let files = Intermediates::for_source(Path::new("docs/guide/install.md"), true);
        assert_eq!(files.markdown, PathBuf::from("docs/guide/install.md.temp"));
        assert_eq!(files.html, PathBuf::from("docs/guide/install.md.temp.html"));
        assert_eq!(files.pdf, PathBuf::from("docs/guide/install.pdf"));
    }

    #[test]
    fn pdf_source_does_not_collide_with_output() {
        let files = Intermediates::for_source(Path::new("weird.pdf"), true);
        assert_eq!(files.pdf, PathBuf::from("weird.pdf.pdf"));
    }

    #[test]
    fn cleanup_removes_all_three() {
        let dir = tempfile::tempdir().unwrap();
        let root = DocsRoot::open(dir.path()).unwrap();
        let files = root.intermediates(Path::new("index.md"), false);
        touch_all(&files);
        let paths: Vec<PathBuf> = files.paths().iter().map(|p| p.to_path_buf()).collect();

        files.cleanup().unwrap();
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn cleanup_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = DocsRoot::open(dir.path()).unwrap();
        let files = root.intermediates(Path::new("index.md"), false);
        std::fs::write(&files.markdown, b"x").unwrap();

        let err = files.cleanup().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("index.md.temp.html"), "{err}");
    }

    #[test]
    fn drop_removes_partial_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let root = DocsRoot::open(dir.path()).unwrap();
        let mut files = root.intermediates(Path::new("index.md"), false);
        std::fs::write(&files.markdown, b"x").unwrap();
        files.mark_created(Intermediate::Markdown);
        std::fs::write(&files.html, b"x").unwrap();
        files.mark_created(Intermediate::Html);
        let markdown = files.markdown.clone();
        let html = files.html.clone();

        drop(files);
        assert!(!markdown.exists());
        assert!(!html.exists());
    }

    #[test]
    fn drop_spares_files_it_did_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let root = DocsRoot::open(dir.path()).unwrap();
        let mut files = root.intermediates(Path::new("index.md"), false);
        std::fs::write(&files.pdf, b"user asset").unwrap();
        std::fs::write(&files.markdown, b"x").unwrap();
        files.mark_created(Intermediate::Markdown);
        let markdown = files.markdown.clone();
        let pdf = files.pdf.clone();

        drop(files);
        assert!(!markdown.exists());
        assert_eq!(std::fs::read(&pdf).unwrap(), b"user asset");
    }

    #[test]
    fn keep_leaves_files_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let root = DocsRoot::open(dir.path()).unwrap();
        let files = root.intermediates(Path::new("index.md"), true);
        touch_all(&files);
        let pdf = files.pdf.clone();

        files.cleanup().unwrap();
        assert!(pdf.exists());
    }

    #[test]
    fn missing_docs_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocsRoot::open(dir.path().join("Docs")).unwrap_err();
        assert!(matches!(err, Docs2PdfError::DocsDirNotFound { .. }));
    }
}
