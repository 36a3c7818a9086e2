//! Extracts the ordered document forest described by an outline document's
//! nested lists.

use crate::application::linkgraph::LINK_SIGIL;
use crate::application::services::html::{Anchor, HtmlFragment};
use crate::domain::documents::identifier;

/// Outline opt-in markers, paired and self-closing. The `DocStack-` spelling
/// is accepted for outlines written for older installations.
pub const SUMMARY_TAGS: [&str; 4] = [
    "<bookwiki-summary></bookwiki-summary>",
    "<bookwiki-summary/>",
    "<DocStack-summary></DocStack-summary>",
    "<DocStack-summary/>",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Position of the anchor among all anchors of the outline.
    pub position: usize,
    pub identifier: String,
    pub display_text: String,
    /// Identifiers of the enclosing entries, root first.
    pub ancestors: Vec<String>,
}

/// Parses rendered outline HTML. Pure: the same input always yields the same
/// entries in the same order.
pub fn parse(html: &str) -> Vec<OutlineEntry> {
    entries(&HtmlFragment::parse(html).anchors())
}

/// Outline entries from an anchor snapshot, in document order. Only anchors
/// with a symbolic target inside a list item take part in the tree.
pub fn entries(anchors: &[Anchor]) -> Vec<OutlineEntry> {
    anchors
        .iter()
        .filter(|a| a.in_list_item)
        .filter_map(|a| {
            let id = outline_identifier(a)?;
            let mut ancestors: Vec<String> = a
                .ancestor_items
                .iter()
                .flatten()
                .filter_map(|pos| anchors.get(*pos).and_then(outline_identifier))
                .collect();
            ancestors.reverse();
            Some(OutlineEntry {
                position: a.position,
                identifier: id,
                display_text: a.text.clone(),
                ancestors,
            })
        })
        .collect()
}

pub fn outline_identifier(anchor: &Anchor) -> Option<String> {
    let target = anchor.symbolic_target(LINK_SIGIL)?;
    let id = identifier::normalize_link_target(target);
    (!id.is_empty()).then_some(id)
}

/// Whether a save of `doc_identifier` should drive the tree: the document is
/// the outline and either the submitted or the stored source carries the tag.
pub fn drives_tree(doc_identifier: &str, submitted: &str, stored: &str) -> bool {
    identifier::is_outline(doc_identifier)
        && [submitted, stored]
            .iter()
            .any(|src| SUMMARY_TAGS.iter().any(|tag| src.contains(tag)))
}

/// Removes every form of the summary tag from a source body.
pub fn strip_summary_tag(markdown: &str) -> String {
    SUMMARY_TAGS
        .iter()
        .fold(markdown.to_string(), |acc, tag| acc.replace(tag, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_nested_entries_in_document_order() {
        let html = r#"<h1>Guide</h1>
<p>Start with <a href="$intro">the intro</a>.</p>
<ul>
  <li><a href="$intro">Introduction</a>
    <ul><li><a href="$setup">Setup</a>
      <ol><li><a href="$setup/linux#apt">Linux</a></li></ol>
    </li></ul>
  </li>
  <li><a href="https://example.com">External</a></li>
  <li><a href="$faq">FAQ</a></li>
</ul>"#;
        let out = parse(html);
        let ids: Vec<_> = out.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["intro", "setup", "setup-linux", "faq"]);
        assert_eq!(out[0].position, 1);
        assert_eq!(out[0].display_text, "Introduction");
        assert!(out[0].ancestors.is_empty());
        assert_eq!(out[1].ancestors, vec!["intro".to_string()]);
        assert_eq!(
            out[2].ancestors,
            vec!["intro".to_string(), "setup".to_string()]
        );
        assert!(out[3].ancestors.is_empty());
        assert_eq!(out[3].position, 5);
    }

    #[test]
    fn parsing_is_idempotent() {
        let html = r#"<ul><li><a href="$a">A</a><ul><li><a href="$b">B</a></li></ul></li></ul>"#;
        assert_eq!(parse(html), parse(html));
    }

    #[test]
    fn summary_tag_detection() {
        assert!(drives_tree("summary.md", "x <bookwiki-summary></bookwiki-summary>", ""));
        assert!(drives_tree("Summary.MD", "", "<bookwiki-summary/>\n- [a]($a)"));
        assert!(drives_tree("summary.md", "<DocStack-summary></DocStack-summary>", ""));
        assert!(drives_tree("summary.md", "", "<DocStack-summary/>"));
        assert!(!drives_tree("intro", SUMMARY_TAGS[0], ""));
        assert!(!drives_tree("summary.md", "- [a]($a)", ""));
        assert_eq!(strip_summary_tag("<bookwiki-summary></bookwiki-summary>\n- x"), "\n- x");
        assert_eq!(strip_summary_tag("<bookwiki-summary/>- y"), "- y");
        assert_eq!(
            strip_summary_tag("<DocStack-summary></DocStack-summary><DocStack-summary/>- z"),
            "- z"
        );
    }
}
