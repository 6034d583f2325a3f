//! Image path rewriting for pages rendered outside the site tree.
//!
//! Documentation sources reference images root-relative to the site
//! (`![logo](/img/logo.png)`). Once a page is rendered on its own from inside
//! the documentation directory, those paths no longer resolve, so each
//! root-relative target is made parent-relative (`../img/logo.png`).
//!
//! Only the parenthesised target of an image reference is touched. Plain
//! links, inline code and everything else pass through unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// `![alt](target)`; alt and target stay on one line, target ends at the first `)`.
static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[.*?\](\(.+?\))").unwrap());

/// Rewrite every root-relative image target in `input` to a parent-relative one.
///
/// Returns `Cow::Borrowed` when nothing matched.
pub fn rewrite_image_paths(input: &str) -> Cow<'_, str> {
    RE_IMAGE.replace_all(input, |caps: &Captures<'_>| {
        let full = &caps[0];
        let target = &caps[1];
        let prefix = &full[..full.len() - target.len()];
        format!("{prefix}{}", rewrite_target(target))
    })
}

/// Rewrite one parenthesised target, e.g. `(/a/b.png)` → `(../a/b.png)`.
fn rewrite_target(target: &str) -> Cow<'_, str> {
    match target.strip_prefix("(/") {
        // `//host/x.png` is protocol-relative, not root-relative.
        Some(rest) if !rest.starts_with('/') => Cow::Owned(format!("(../{rest}")),
        _ => Cow::Borrowed(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_relative_image_becomes_parent_relative() {
        assert_eq!(rewrite_image_paths("![x](/a/b.png)"), "![x](../a/b.png)");
    }

    #[test]
    fn relative_and_absolute_urls_unchanged() {
        for input in [
            "![x](a/b.png)",
            "![x](./a/b.png)",
            "![x](../a/b.png)",
            "![x](https://example.com/a.png)",
            "![x](//cdn.example.com/a.png)",
        ] {
            assert_eq!(rewrite_image_paths(input), input);
        }
    }

    #[test]
    fn every_match_in_body_rewritten() {
        let input = "# Title\n\n![one](/img/1.png) and ![two](/img/2.png)\n\n![three](img/3.png)\n";
        let expected =
            "# Title\n\n![one](../img/1.png) and ![two](../img/2.png)\n\n![three](img/3.png)\n";
        assert_eq!(rewrite_image_paths(input), expected);
    }

    #[test]
    fn plain_links_untouched() {
        let input = "See [the docs](/docs/index.md) for details.";
        assert_eq!(rewrite_image_paths(input), input);
    }

    #[test]
    fn empty_alt_text() {
        assert_eq!(rewrite_image_paths("![](/logo.svg)"), "![](../logo.svg)");
    }

    #[test]
    fn title_attribute_preserved() {
        assert_eq!(
            rewrite_image_paths(r#"![d](/img/d.png "Diagram")"#),
            r#"![d](../img/d.png "Diagram")"#
        );
    }

    #[test]
    fn alt_text_containing_target_is_not_rewritten() {
        // Only the target is replaced, never a lookalike inside the alt text.
        assert_eq!(
            rewrite_image_paths("![see (/a.png)](/a.png)"),
            "![see (/a.png)](../a.png)"
        );
    }

    #[test]
    fn no_matches_borrows() {
        let input = "no images here";
        assert!(matches!(rewrite_image_paths(input), Cow::Borrowed(_)));
    }

    #[test]
    fn image_does_not_span_lines() {
        let input = "![broken\n](/a.png)";
        assert_eq!(rewrite_image_paths(input), input);
    }
}
