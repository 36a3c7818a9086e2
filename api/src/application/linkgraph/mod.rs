use std::collections::{BTreeMap, HashMap};

use crate::application::ports::address_builder::AddressBuilder;
use crate::application::services::html::{Anchor, HtmlFragment};
use crate::domain::documents::document::Document;
use crate::domain::documents::identifier;

/// Prefix marking a symbolic cross-document link (`$identifier` or `$id`).
pub const LINK_SIGIL: char = '$';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub address: String,
    pub document_id: i64,
}

/// Per-book lookup from symbolic keys to document addresses. Built from the
/// current document rows for one call and never cached.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    entries: HashMap<String, LinkTarget>,
}

impl IdentifierMap {
    pub fn build<A>(book_identifier: &str, documents: &[Document], addresses: &A) -> Self
    where
        A: AddressBuilder + ?Sized,
    {
        let mut entries = HashMap::with_capacity(documents.len() * 2);
        for doc in documents {
            if !doc.identifier.is_empty() {
                entries.insert(
                    doc.identifier.to_lowercase(),
                    LinkTarget {
                        address: addresses.document_address(book_identifier, &doc.identifier),
                        document_id: doc.id,
                    },
                );
            }
            entries.insert(
                doc.id.to_string(),
                LinkTarget {
                    address: addresses.document_address(book_identifier, &doc.id.to_string()),
                    document_id: doc.id,
                },
            );
        }
        Self { entries }
    }

    /// Looks up a key given without the sigil, case-insensitively.
    pub fn lookup(&self, key: &str) -> Option<&LinkTarget> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of the resolve stage. `resolved` is the typed side channel consumed
/// by outline linking: anchor position -> document id.
#[derive(Debug, Clone, Default)]
pub struct ResolvedHtml {
    pub html: String,
    pub anchors: Vec<Anchor>,
    pub resolved: BTreeMap<usize, i64>,
}

impl ResolvedHtml {
    pub fn resolved_id(&self, position: usize) -> Option<i64> {
        self.resolved.get(&position).copied()
    }

    /// Anchors whose targets used the sigil but matched nothing.
    pub fn broken_links(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter().filter(|a| {
            a.symbolic_target(LINK_SIGIL).is_some() && !self.resolved.contains_key(&a.position)
        })
    }
}

/// Rewrites every `$key[#fragment]` anchor into its address. Unknown keys are
/// left untouched.
pub fn resolve(html: &str, map: &IdentifierMap) -> ResolvedHtml {
    let fragment = HtmlFragment::parse(html);
    let mut resolved = BTreeMap::new();
    let anchors = fragment.rewrite_anchors(|anchor| {
        let target = anchor.symbolic_target(LINK_SIGIL)?;
        let (key, fragment_part) = match target.split_once('#') {
            Some((key, rest)) => (key, Some(rest)),
            None => (target, None),
        };
        let link = map.lookup(key)?;
        resolved.insert(anchor.position, link.document_id);
        Some(match fragment_part {
            Some(rest) => format!("{}#{}", link.address, rest),
            None => link.address.clone(),
        })
    });
    ResolvedHtml {
        html: fragment.to_html(),
        anchors,
        resolved,
    }
}

/// Resolves the identifier an outline anchor refers to, preferring the side
/// channel and falling back to the (possibly refreshed) map.
pub fn anchor_document_id(
    resolved: &ResolvedHtml,
    map: &IdentifierMap,
    anchor: &Anchor,
) -> Option<i64> {
    if let Some(id) = resolved.resolved_id(anchor.position) {
        return Some(id);
    }
    let target = anchor.symbolic_target(LINK_SIGIL)?;
    map.lookup(&identifier::normalize_link_target(target))
        .map(|t| t.document_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{PrefixAddresses, doc};

    fn guide_map() -> IdentifierMap {
        let docs = vec![doc(1, 10, "intro", "Introduction"), doc(2, 10, "Setup", "Setup")];
        IdentifierMap::build("guide", &docs, &PrefixAddresses::default())
    }

    #[test]
    fn registers_identifier_and_numeric_keys() {
        let map = guide_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map.lookup("INTRO").map(|t| t.document_id), Some(1));
        assert_eq!(
            map.lookup("2").map(|t| t.address.as_str()),
            Some("/docs/guide/2")
        );
        assert_eq!(
            map.lookup("setup").map(|t| t.address.as_str()),
            Some("/docs/guide/Setup")
        );
    }

    #[test]
    fn rewrites_symbolic_links_and_keeps_fragments() {
        let map = guide_map();
        let out = resolve(
            r##"<p><a href="$Intro#usage">see</a> <a href="$2">two</a> <a href="$missing">x</a> <a href="/abs">y</a></p>"##,
            &map,
        );
        assert!(out.html.contains(r##"href="/docs/guide/intro#usage""##));
        assert!(out.html.contains(r#"href="/docs/guide/2""#));
        assert!(out.html.contains(r#"href="$missing""#));
        assert!(out.html.contains(r#"href="/abs""#));
        assert_eq!(out.resolved_id(0), Some(1));
        assert_eq!(out.resolved_id(1), Some(2));
        assert_eq!(out.resolved_id(2), None);
        let broken: Vec<_> = out.broken_links().map(|a| a.position).collect();
        assert_eq!(broken, vec![2]);
    }

    #[test]
    fn resolution_is_deterministic_and_follows_renames() {
        let html = r#"<a href="$my-doc">Mine</a>"#;
        let docs = vec![doc(7, 10, "my-doc", "Mine")];
        let map = IdentifierMap::build("guide", &docs, &PrefixAddresses::default());
        let first = resolve(html, &map);
        let second = resolve(html, &map);
        assert_eq!(first.html, second.html);

        let moved = IdentifierMap::build("handbook", &docs, &PrefixAddresses::default());
        let third = resolve(html, &moved);
        assert_ne!(first.html, third.html);
        assert!(third.html.contains("/docs/handbook/my-doc"));
    }

    #[test]
    fn falls_back_to_map_for_unresolved_anchors() {
        let before = resolve(r#"<ul><li><a href="$new-page">New</a></li></ul>"#, &guide_map());
        assert_eq!(before.resolved_id(0), None);
        let docs = vec![doc(9, 10, "new-page", "New")];
        let refreshed = IdentifierMap::build("guide", &docs, &PrefixAddresses::default());
        assert_eq!(
            anchor_document_id(&before, &refreshed, &before.anchors[0]),
            Some(9)
        );
    }
}
