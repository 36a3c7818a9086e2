use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

use super::index_children;
use crate::application::services::html::HtmlFragment;
use crate::domain::documents::book::Book;
use crate::domain::documents::document::{Document, DocumentContent};

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub document: Document,
    /// 1-based position in the export sequence.
    pub sequence: usize,
    pub depth: usize,
    pub file_name: String,
    pub html: String,
    pub hash: String,
}

pub trait ArtifactRenderer {
    fn render(&self, doc: &Document, sequence: usize, depth: usize)
    -> anyhow::Result<ExportArtifact>;
}

/// Pre-order walk below `start_parent` (0 = whole book). Each node's children
/// are emitted before its next sibling; siblings ascend by order index.
pub fn export_walk<R>(
    documents: &[Document],
    start_parent: i64,
    renderer: &R,
    acc: &mut Vec<ExportArtifact>,
) -> anyhow::Result<()>
where
    R: ArtifactRenderer + ?Sized,
{
    let children = index_children(documents);
    let mut visited = HashSet::new();
    walk(&children, start_parent, 0, renderer, &mut visited, acc)
}

fn walk<R>(
    children: &HashMap<i64, Vec<&Document>>,
    parent_id: i64,
    depth: usize,
    renderer: &R,
    visited: &mut HashSet<i64>,
    acc: &mut Vec<ExportArtifact>,
) -> anyhow::Result<()>
where
    R: ArtifactRenderer + ?Sized,
{
    let Some(siblings) = children.get(&parent_id) else {
        return Ok(());
    };
    for doc in siblings {
        if !visited.insert(doc.id) {
            continue;
        }
        let artifact = renderer.render(doc, acc.len() + 1, depth)?;
        acc.push(artifact);
        walk(children, doc.id, depth + 1, renderer, visited, acc)?;
    }
    Ok(())
}

/// Renders each document as a self-contained HTML page.
pub struct StandaloneRenderer<'a> {
    pub book: &'a Book,
    /// Origin prepended to `/uploads/...` image sources.
    pub base_url: Option<&'a str>,
    pub contents: &'a HashMap<i64, DocumentContent>,
}

impl ArtifactRenderer for StandaloneRenderer<'_> {
    fn render(
        &self,
        doc: &Document,
        sequence: usize,
        depth: usize,
    ) -> anyhow::Result<ExportArtifact> {
        let content = self
            .contents
            .get(&doc.id)
            .ok_or_else(|| anyhow::anyhow!("content missing for document {}", doc.id))?;

        let fragment = HtmlFragment::parse(&content.content);
        if let Some(base) = self.base_url {
            let base = base.trim_end_matches('/');
            fragment.rewrite_attribute("img", "src", |src| {
                src.starts_with("/uploads/").then(|| format!("{base}{src}"))
            });
        }
        let body = fragment.to_html();

        let html = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title} - {book}</title></head>\
             <body><article class=\"document\" data-document-id=\"{id}\"><h1>{title}</h1>{body}</article></body></html>\n",
            title = htmlescape::encode_minimal(&doc.name),
            book = htmlescape::encode_minimal(&self.book.name),
            id = doc.id,
        );
        Ok(ExportArtifact {
            document: doc.clone(),
            sequence,
            depth,
            file_name: format!("{:04}-{}.html", sequence, file_stem(doc)),
            hash: sha256_hex(&html),
            html,
        })
    }
}

fn file_stem(doc: &Document) -> String {
    let stem: String = doc
        .address_segment()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if stem.is_empty() {
        doc.id.to_string()
    } else {
        stem
    }
}

fn sha256_hex(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{book, child};

    struct NameOnly;

    impl ArtifactRenderer for NameOnly {
        fn render(
            &self,
            doc: &Document,
            sequence: usize,
            depth: usize,
        ) -> anyhow::Result<ExportArtifact> {
            if doc.id == 99 {
                anyhow::bail!("render failed");
            }
            Ok(ExportArtifact {
                document: doc.clone(),
                sequence,
                depth,
                file_name: format!("{}.html", doc.id),
                html: String::new(),
                hash: String::new(),
            })
        }
    }

    fn walk_ids(docs: &[Document], start: i64) -> Vec<(i64, usize)> {
        let mut acc = Vec::new();
        export_walk(docs, start, &NameOnly, &mut acc).unwrap();
        acc.iter().map(|a| (a.document.id, a.depth)).collect()
    }

    #[test]
    fn visits_pre_order_with_sorted_siblings() {
        // stored out of order on purpose
        let docs = vec![
            child(4, 0, 5),
            child(3, 1, 3),
            child(1, 0, 0),
            child(2, 1, 1),
            child(5, 2, 2),
        ];
        assert_eq!(
            walk_ids(&docs, 0),
            vec![(1, 0), (2, 1), (5, 2), (3, 1), (4, 0)]
        );
        assert_eq!(walk_ids(&docs, 1), vec![(2, 0), (5, 1), (3, 0)]);
    }

    #[test]
    fn each_node_once_even_with_cycles() {
        let docs = vec![child(1, 0, 0), child(2, 3, 1), child(3, 2, 2)];
        assert_eq!(walk_ids(&docs, 0), vec![(1, 0)]);
        assert_eq!(walk_ids(&docs, 2), vec![(3, 0), (2, 1)]);
    }

    #[test]
    fn renderer_errors_abort_the_walk() {
        let docs = vec![child(1, 0, 0), child(99, 0, 1)];
        let mut acc = Vec::new();
        assert!(export_walk(&docs, 0, &NameOnly, &mut acc).is_err());
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn standalone_pages_escape_titles_and_absolutize_uploads() {
        let b = book(10, "guide");
        let mut d = child(1, 0, 0);
        d.name = "Tips & <Tricks>".into();
        d.identifier = "tips".into();
        let contents = HashMap::from([(
            1,
            DocumentContent {
                document_id: 1,
                markdown: String::new(),
                content: r#"<p><img src="/uploads/a.png"></p>"#.into(),
                release: None,
            },
        )]);
        let renderer = StandaloneRenderer {
            book: &b,
            base_url: Some("https://wiki.example.com/"),
            contents: &contents,
        };
        let artifact = renderer.render(&d, 3, 0).unwrap();
        assert_eq!(artifact.file_name, "0003-tips.html");
        assert!(artifact.html.contains("<h1>Tips &amp; &lt;Tricks&gt;</h1>"));
        assert!(artifact
            .html
            .contains(r#"src="https://wiki.example.com/uploads/a.png""#));
        assert_eq!(artifact.hash.len(), 64);
    }

    #[test]
    fn missing_content_is_an_error() {
        let b = book(10, "guide");
        let contents = HashMap::new();
        let renderer = StandaloneRenderer {
            book: &b,
            base_url: None,
            contents: &contents,
        };
        assert!(renderer.render(&child(1, 0, 0), 1, 0).is_err());
    }
}
