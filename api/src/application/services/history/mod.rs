use similar::{Algorithm, ChangeTag, TextDiff};

use crate::application::ports::history_repository::HistoryRepository;
use crate::domain::documents::document::{Document, DocumentContent};
use crate::domain::documents::history::{DocumentHistory, HistoryAction, NewHistory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineType {
    Added,
    Deleted,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub old_line_number: Option<u32>,
    pub new_line_number: Option<u32>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct HistoryComparison {
    pub history: DocumentHistory,
    pub current_markdown: String,
    pub diff_lines: Vec<DiffLine>,
}

pub struct HistoryRecorder<'a, H: HistoryRepository + ?Sized> {
    pub repo: &'a H,
}

impl<'a, H: HistoryRepository + ?Sized> HistoryRecorder<'a, H> {
    /// Snapshots `prior` (the state before a commit) and returns the history id.
    pub async fn record(
        &self,
        document: &Document,
        prior: &DocumentContent,
        action: HistoryAction,
        modified_by: i64,
    ) -> anyhow::Result<i64> {
        let row = self
            .repo
            .insert(NewHistory {
                document_id: document.id,
                document_name: document.name.clone(),
                parent_id: document.parent_id,
                version: document.version,
                markdown: prior.markdown.clone(),
                content: prior.content.clone(),
                action,
                member_id: document.member_id,
                modified_by,
            })
            .await?;
        Ok(row.id)
    }

    /// Entry `history_id` when it belongs to `document_id`.
    pub async fn get(
        &self,
        history_id: i64,
        document_id: i64,
    ) -> anyhow::Result<Option<DocumentHistory>> {
        Ok(self
            .repo
            .get(history_id)
            .await?
            .filter(|h| h.document_id == document_id))
    }

    pub async fn list(
        &self,
        document_id: i64,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<(Vec<DocumentHistory>, i64)> {
        self.repo
            .list_page(document_id, page.max(1), page_size.max(1))
            .await
    }

    pub async fn delete(&self, history_id: i64, document_id: i64) -> anyhow::Result<bool> {
        self.repo.delete(history_id, document_id).await
    }
}

/// Line diff from the historical source to the current one.
pub fn compare(history: DocumentHistory, current_markdown: &str) -> HistoryComparison {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(history.markdown.as_str(), current_markdown);
    let mut lines = Vec::new();
    let mut old_line = 0u32;
    let mut new_line = 0u32;
    for change in diff.iter_all_changes() {
        let content = change.to_string().trim_end().to_string();
        let line = match change.tag() {
            ChangeTag::Delete => {
                old_line += 1;
                DiffLine {
                    line_type: DiffLineType::Deleted,
                    old_line_number: Some(old_line),
                    new_line_number: None,
                    content,
                }
            }
            ChangeTag::Insert => {
                new_line += 1;
                DiffLine {
                    line_type: DiffLineType::Added,
                    old_line_number: None,
                    new_line_number: Some(new_line),
                    content,
                }
            }
            ChangeTag::Equal => {
                old_line += 1;
                new_line += 1;
                DiffLine {
                    line_type: DiffLineType::Context,
                    old_line_number: Some(old_line),
                    new_line_number: Some(new_line),
                    content,
                }
            }
        };
        lines.push(line);
    }
    HistoryComparison {
        history,
        current_markdown: current_markdown.to_string(),
        diff_lines: lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{MemoryHistories, doc};

    fn prior(markdown: &str) -> DocumentContent {
        DocumentContent {
            document_id: 1,
            markdown: markdown.into(),
            content: format!("<p>{markdown}</p>"),
            release: None,
        }
    }

    #[tokio::test]
    async fn records_and_lists_newest_first() {
        let repo = MemoryHistories::default();
        let recorder = HistoryRecorder { repo: &repo };
        let d = doc(1, 10, "intro", "Intro");
        let first = recorder
            .record(&d, &prior("one"), HistoryAction::Modify, 7)
            .await
            .unwrap();
        let second = recorder
            .record(&d, &prior("two"), HistoryAction::Restore, 7)
            .await
            .unwrap();

        let (page, total) = recorder.list(1, 1, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.iter().map(|h| h.id).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(page[0].action, "restore");
        assert_eq!(page[1].markdown, "one");
        assert_eq!(page[1].modified_by, 7);

        let (page2, _) = recorder.list(1, 2, 1).await.unwrap();
        assert_eq!(page2[0].id, first);
    }

    #[tokio::test]
    async fn get_is_scoped_to_the_document() {
        let repo = MemoryHistories::default();
        let recorder = HistoryRecorder { repo: &repo };
        let id = recorder
            .record(&doc(1, 10, "a", "A"), &prior("x"), HistoryAction::Modify, 1)
            .await
            .unwrap();
        assert!(recorder.get(id, 1).await.unwrap().is_some());
        assert!(recorder.get(id, 2).await.unwrap().is_none());
        assert!(!recorder.delete(id, 2).await.unwrap());
        assert!(recorder.delete(id, 1).await.unwrap());
        assert!(recorder.get(id, 1).await.unwrap().is_none());
    }

    #[test]
    fn compare_produces_numbered_line_diff() {
        let history = DocumentHistory {
            id: 1,
            document_id: 1,
            document_name: "A".into(),
            parent_id: 0,
            version: 1,
            markdown: "a\nb\nc\n".into(),
            content: String::new(),
            action: "modify".into(),
            action_name: String::new(),
            member_id: 1,
            modified_by: 1,
            created_at: crate::application::testing::epoch(),
        };
        let cmp = compare(history, "a\nc\nd\n");
        let kinds: Vec<_> = cmp
            .diff_lines
            .iter()
            .map(|l| (l.line_type, l.content.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (DiffLineType::Context, "a"),
                (DiffLineType::Deleted, "b"),
                (DiffLineType::Context, "c"),
                (DiffLineType::Added, "d"),
            ]
        );
        assert_eq!(cmp.diff_lines[3].new_line_number, Some(3));
    }
}
