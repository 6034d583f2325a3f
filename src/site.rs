//! Site configuration: the ordered page list from an mkdocs-style YAML file.
//!
//! The page list is the only thing the pipeline needs from the file, plus the
//! optional `site_name` (used as the PDF title) and `docs_dir`. Both the
//! legacy `pages` key and the newer `nav` key are accepted; `pages` wins when
//! both are present.
//!
//! Accepted entry shapes, all of which may be mixed in one list:
//!
//! ```yaml
//! pages:
//!   - ['index.md', 'Home']        # [path, title] pair (path first)
//!   - 'about.md'                  # bare path
//!   - Install: 'install.md'       # title → path
//!   - Guide:                      # title → nested section
//!       - 'guide/one.md'
//!       - Two: 'guide/two.md'
//! ```
//!
//! Nested sections are flattened depth-first, so the resulting order is
//! exactly the reading order of the file. Entries pointing at another site
//! (`GitHub: https://github.com/...` or `//host/...`) are not pages and are
//! skipped.

use crate::error::Docs2PdfError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory used when neither the caller nor the site configuration names one.
pub const DEFAULT_DOCS_DIR: &str = "Docs";

/// `scheme://…` or protocol-relative `//…` nav targets.
static RE_EXTERNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:)?//").unwrap());

/// One entry of the page list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Document path, relative to the documentation directory.
    pub path: PathBuf,
    /// Title given in the configuration, if any.
    pub title: Option<String>,
}

/// The parts of the site configuration this tool uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// `site_name`, if set.
    pub site_name: Option<String>,
    /// `docs_dir`, if set. Relative to the configuration file.
    pub docs_dir: Option<PathBuf>,
    /// Ordered page list.
    pub pages: Vec<PageEntry>,
}

impl SiteConfig {
    /// Read and parse a site configuration file.
    pub fn load(path: &Path) -> Result<Self, Docs2PdfError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Docs2PdfError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Docs2PdfError::ConfigRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let config = Self::parse(&contents, path)?;
        debug!(
            "Loaded {} page entries from {}",
            config.pages.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse site configuration YAML. `origin` is only used in error messages.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, Docs2PdfError> {
        let root: Value =
            serde_yaml::from_str(contents).map_err(|e| Docs2PdfError::InvalidYaml {
                path: origin.to_path_buf(),
                detail: e.to_string(),
            })?;

        let missing = || Docs2PdfError::MissingPages {
            path: origin.to_path_buf(),
        };
        let map = root.as_mapping().ok_or_else(missing)?;

        let list = ["pages", "nav"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(Value::as_sequence)
            .ok_or_else(missing)?;

        let mut pages = Vec::with_capacity(list.len());
        for (i, entry) in list.iter().enumerate() {
            collect_entry(entry, None, &mut pages).map_err(|detail| {
                Docs2PdfError::InvalidPageEntry {
                    path: origin.to_path_buf(),
                    index: i + 1,
                    detail,
                }
            })?;
        }

        Ok(Self {
            site_name: string_field(map, "site_name"),
            docs_dir: string_field(map, "docs_dir").map(PathBuf::from),
            pages,
        })
    }

    /// Resolve the documentation directory for a configuration at `config_path`.
    ///
    /// Precedence: `override_dir` > `docs_dir` key > [`DEFAULT_DOCS_DIR`].
    /// Relative directories are taken relative to the configuration file.
    pub fn resolve_docs_dir(&self, config_path: &Path, override_dir: Option<&Path>) -> PathBuf {
        let dir = override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.docs_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR));
        if dir.is_absolute() {
            return dir;
        }
        match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(dir),
            _ => dir,
        }
    }
}

fn string_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Append the page(s) described by one YAML entry to `out`.
fn collect_entry(
    entry: &Value,
    title: Option<&str>,
    out: &mut Vec<PageEntry>,
) -> Result<(), String> {
    match entry {
        Value::String(path) => {
            push_page(out, path, title.map(str::to_string));
            Ok(())
        }
        Value::Sequence(items) if title.is_none() => match items.first() {
            Some(Value::String(path)) => {
                let title = items.get(1).and_then(Value::as_str).map(str::to_string);
                push_page(out, path, title);
                Ok(())
            }
            Some(other) => Err(format!("first element must be a path, got {}", kind(other))),
            None => Err("empty list".to_string()),
        },
        // A titled sequence is a section of further entries.
        Value::Sequence(items) => {
            for item in items {
                collect_entry(item, None, out)?;
            }
            Ok(())
        }
        Value::Mapping(map) if map.len() == 1 => {
            let (key, value) = map.iter().next().ok_or("empty mapping")?;
            let key = key
                .as_str()
                .ok_or_else(|| format!("title must be a string, got {}", kind(key)))?;
            collect_entry(value, Some(key), out)
        }
        Value::Mapping(map) => Err(format!(
            "mapping must have exactly one 'Title: path' pair, got {} keys",
            map.len()
        )),
        other => Err(format!("unsupported {}", kind(other))),
    }
}

fn push_page(out: &mut Vec<PageEntry>, path: &str, title: Option<String>) {
    if RE_EXTERNAL.is_match(path) {
        debug!("Skipping external nav link {}", path);
        return;
    }
    out.push(PageEntry {
        path: PathBuf::from(path),
        title,
    });
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<SiteConfig, Docs2PdfError> {
        SiteConfig::parse(yaml, Path::new("mkdocs.yml"))
    }

    fn paths(config: &SiteConfig) -> Vec<&str> {
        config
            .pages
            .iter()
            .map(|p| p.path.to_str().unwrap())
            .collect()
    }

    #[test]
    fn legacy_pairs_keep_order_and_titles() {
        let yaml = "site_name: Manual\npages:\n  - ['index.md', 'Home']\n  - ['install.md', 'Install']\n  - ['usage.md', 'Usage']\n";
        let config = parse(yaml).unwrap();
        assert_eq!(paths(&config), vec!["index.md", "install.md", "usage.md"]);
        assert_eq!(config.pages[0].title.as_deref(), Some("Home"));
        assert_eq!(config.site_name.as_deref(), Some("Manual"));
    }

    #[test]
    fn external_nav_links_are_skipped() {
        let yaml = "nav:\n  - Home: index.md\n  - GitHub: https://github.com/x/y\n  - //cdn.example.com/x.md\n  - ['http://example.com', 'Site']\n  - usage.md\n";
        let config = parse(yaml).unwrap();
        assert_eq!(paths(&config), vec!["index.md", "usage.md"]);
    }

    #[test]
    fn colon_in_relative_path_is_still_a_page() {
        let config = parse("pages:\n  - 'guide/a:b.md'\n").unwrap();
        assert_eq!(paths(&config), vec!["guide/a:b.md"]);
    }

    #[test]
    fn single_element_pair_has_no_title() {
        let config = parse("pages:\n  - ['index.md']\n").unwrap();
        assert_eq!(paths(&config), vec!["index.md"]);
        assert_eq!(config.pages[0].title, None);
    }

    #[test]
    fn mixed_shapes_flatten_depth_first() {
        let yaml = r#"
nav:
  - index.md
  - Install: install.md
  - Guide:
      - guide/one.md
      - Two: guide/two.md
  - ['faq.md', 'FAQ']
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(
            paths(&config),
            vec![
                "index.md",
                "install.md",
                "guide/one.md",
                "guide/two.md",
                "faq.md"
            ]
        );
        assert_eq!(config.pages[1].title.as_deref(), Some("Install"));
        assert_eq!(config.pages[3].title.as_deref(), Some("Two"));
    }

    #[test]
    fn pages_key_preferred_over_nav() {
        let config = parse("pages:\n  - a.md\nnav:\n  - b.md\n").unwrap();
        assert_eq!(paths(&config), vec!["a.md"]);
    }

    #[test]
    fn missing_pages_key_is_an_error() {
        let err = parse("site_name: x\n").unwrap_err();
        assert!(matches!(err, Docs2PdfError::MissingPages { .. }), "{err}");
    }

    #[test]
    fn pages_must_be_a_list() {
        let err = parse("pages: index.md\n").unwrap_err();
        assert!(matches!(err, Docs2PdfError::MissingPages { .. }), "{err}");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = parse("pages: [unclosed\n").unwrap_err();
        assert!(matches!(err, Docs2PdfError::InvalidYaml { .. }), "{err}");
    }

    #[test]
    fn numeric_entry_reports_its_position() {
        let err = parse("pages:\n  - index.md\n  - 42\n").unwrap_err();
        match err {
            Docs2PdfError::InvalidPageEntry { index, detail, .. } => {
                assert_eq!(index, 2);
                assert!(detail.contains("number"), "{detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_page_list_parses() {
        let config = parse("pages: []\n").unwrap();
        assert!(config.pages.is_empty());
    }

    #[test]
    fn docs_dir_precedence() {
        let config = parse("docs_dir: documentation\npages: []\n").unwrap();
        let cfg_path = Path::new("site/mkdocs.yml");

        assert_eq!(
            config.resolve_docs_dir(cfg_path, None),
            PathBuf::from("site/documentation")
        );
        assert_eq!(
            config.resolve_docs_dir(cfg_path, Some(Path::new("other"))),
            PathBuf::from("site/other")
        );

        let bare = parse("pages: []\n").unwrap();
        assert_eq!(
            bare.resolve_docs_dir(Path::new("mkdocs.yml"), None),
            PathBuf::from("Docs")
        );
    }

    #[test]
    fn load_missing_file_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SiteConfig::load(&dir.path().join("mkdocs.yml")).unwrap_err();
        assert!(matches!(err, Docs2PdfError::ConfigNotFound { .. }), "{err}");
    }
}
