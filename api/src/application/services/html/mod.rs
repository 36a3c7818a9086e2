//! Thin wrapper over the kuchikiki DOM used for anchor rewriting, outline
//! extraction and export rendering.
//!
//! `HtmlFragment` holds `Rc` nodes and is not `Send`; callers parse, mutate
//! and serialize synchronously and hand owned data back to async code.

use kuchikiki::NodeRef;
use kuchikiki::traits::*;

/// Structural snapshot of one `<a>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Document-order index among all anchors of the fragment.
    pub position: usize,
    /// `href` as it was before any rewrite.
    pub href: Option<String>,
    pub text: String,
    pub in_list_item: bool,
    /// For every list item enclosing the anchor's own item (nearest first), the
    /// position of that item's heading anchor.
    pub ancestor_items: Vec<Option<usize>>,
}

impl Anchor {
    /// Position of the anchor heading the nearest enclosing parent item.
    pub fn parent_item_anchor(&self) -> Option<usize> {
        self.ancestor_items.first().copied().flatten()
    }

    pub fn symbolic_target(&self, sigil: char) -> Option<&str> {
        self.href.as_deref().and_then(|h| h.strip_prefix(sigil))
    }
}

pub struct HtmlFragment {
    document: NodeRef,
}

impl HtmlFragment {
    pub fn parse(html: &str) -> Self {
        Self {
            document: kuchikiki::parse_html().one(html),
        }
    }

    fn anchor_nodes(&self) -> Vec<NodeRef> {
        match self.document.select("a") {
            Ok(selection) => selection.map(|el| el.as_node().clone()).collect(),
            Err(()) => Vec::new(),
        }
    }

    pub fn anchors(&self) -> Vec<Anchor> {
        let nodes = self.anchor_nodes();
        nodes
            .iter()
            .enumerate()
            .map(|(position, node)| snapshot(&nodes, position, node))
            .collect()
    }

    /// Snapshots every anchor, then replaces the `href` of each anchor for
    /// which `rewrite` returns a value. The returned snapshots carry the
    /// original targets.
    pub fn rewrite_anchors<F>(&self, mut rewrite: F) -> Vec<Anchor>
    where
        F: FnMut(&Anchor) -> Option<String>,
    {
        let nodes = self.anchor_nodes();
        let anchors: Vec<Anchor> = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| snapshot(&nodes, position, node))
            .collect();
        for (node, anchor) in nodes.iter().zip(anchors.iter()) {
            if let Some(href) = rewrite(anchor) {
                if let Some(el) = node.as_element() {
                    el.attributes.borrow_mut().insert("href", href);
                }
            }
        }
        anchors
    }

    /// Rewrites `attr` on every element matching `selector`; returns how many changed.
    pub fn rewrite_attribute<F>(&self, selector: &str, attr: &str, mut rewrite: F) -> usize
    where
        F: FnMut(&str) -> Option<String>,
    {
        let Ok(selection) = self.document.select(selector) else {
            return 0;
        };
        let mut changed = 0;
        for el in selection {
            let mut attrs = el.attributes.borrow_mut();
            let next = attrs.get(attr).and_then(|v| rewrite(v));
            if let Some(value) = next {
                attrs.insert(attr, value);
                changed += 1;
            }
        }
        changed
    }

    /// Serializes the body content, without the html/head/body wrappers the
    /// parser adds.
    pub fn to_html(&self) -> String {
        let mut out = Vec::new();
        if let Ok(body) = self.document.select_first("body") {
            for child in body.as_node().children() {
                if let Err(e) = child.serialize(&mut out) {
                    tracing::warn!(error = ?e, "html_serialize_failed");
                }
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn is_element(node: &NodeRef, tag: &str) -> bool {
    node.as_element()
        .map(|el| &*el.name.local == tag)
        .unwrap_or(false)
}

fn snapshot(nodes: &[NodeRef], position: usize, node: &NodeRef) -> Anchor {
    let href = node
        .as_element()
        .and_then(|el| el.attributes.borrow().get("href").map(str::to_string));
    let mut items = node.ancestors().filter(|n| is_element(n, "li"));
    let in_list_item = items.next().is_some();
    let ancestor_items = items
        .map(|item| heading_anchor_position(nodes, &item))
        .collect();
    Anchor {
        position,
        href,
        text: node.text_contents().trim().to_string(),
        in_list_item,
        ancestor_items,
    }
}

/// First anchor owned by `item` itself, ignoring anchors of nested items.
fn heading_anchor_position(nodes: &[NodeRef], item: &NodeRef) -> Option<usize> {
    let selection = item.select("a").ok()?;
    for el in selection {
        let node = el.as_node();
        let owner = node.ancestors().find(|n| is_element(n, "li"));
        if owner.as_ref() == Some(item) {
            return nodes.iter().position(|n| n == node);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"<p><a href="https://example.com">site</a></p>
<ul>
  <li><a href="$intro">Introduction</a>
    <ul>
      <li><a href="$setup">Setup</a></li>
      <li><p><a href="$install#linux">Install</a></p></li>
    </ul>
  </li>
  <li>Loose item<ul><li><a href="$orphan">Orphan</a></li></ul></li>
</ul>"#;

    #[test]
    fn snapshots_anchor_structure_in_document_order() {
        let anchors = HtmlFragment::parse(NESTED).anchors();
        assert_eq!(anchors.len(), 5);

        assert_eq!(anchors[0].href.as_deref(), Some("https://example.com"));
        assert!(!anchors[0].in_list_item);

        assert_eq!(anchors[1].text, "Introduction");
        assert!(anchors[1].in_list_item);
        assert_eq!(anchors[1].parent_item_anchor(), None);

        assert_eq!(anchors[2].parent_item_anchor(), Some(1));
        assert_eq!(anchors[3].parent_item_anchor(), Some(1));
        assert_eq!(anchors[3].symbolic_target('$'), Some("install#linux"));

        // enclosing item without its own anchor
        assert_eq!(anchors[4].ancestor_items, vec![None]);
        assert_eq!(anchors[4].parent_item_anchor(), None);
    }

    #[test]
    fn rewrites_hrefs_and_keeps_original_targets() {
        let fragment = HtmlFragment::parse(r#"<ul><li><a href="$a">A</a></li></ul>"#);
        let anchors = fragment.rewrite_anchors(|a| {
            a.symbolic_target('$').map(|t| format!("/docs/book/{t}"))
        });
        assert_eq!(anchors[0].href.as_deref(), Some("$a"));
        let html = fragment.to_html();
        assert_eq!(html, r#"<ul><li><a href="/docs/book/a">A</a></li></ul>"#);
    }

    #[test]
    fn rewrites_matching_attributes() {
        let fragment =
            HtmlFragment::parse(r#"<img src="/uploads/a.png"><img src="https://cdn/b.png">"#);
        let changed = fragment.rewrite_attribute("img", "src", |src| {
            src.starts_with("/uploads/")
                .then(|| format!("https://wiki.example.com{src}"))
        });
        assert_eq!(changed, 1);
        assert!(fragment
            .to_html()
            .contains(r#"src="https://wiki.example.com/uploads/a.png""#));
    }
}
