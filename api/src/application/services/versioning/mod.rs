//! Optimistic concurrency for content saves.
//!
//! A save either commits (stamps match, or forced) or reports a conflict with
//! the server-side state. The repository write is a compare-and-swap on the
//! stamp, so two writers holding the same stamp cannot both commit.

use chrono::{DateTime, Utc};

use crate::application::ports::document_repository::DocumentRepository;
use crate::application::ports::history_repository::HistoryRepository;
use crate::application::services::history::HistoryRecorder;
use crate::domain::documents::document::{ContentCommit, Document};
use crate::domain::documents::error::DocumentError;
use crate::domain::documents::history::HistoryAction;

/// Next stamp: wall-clock seconds, but always strictly above `current`.
pub fn next_version(current: i64, now: DateTime<Utc>) -> i64 {
    now.timestamp().max(current + 1)
}

#[derive(Debug, Clone)]
pub struct ContentEdit {
    pub submitted_version: i64,
    pub markdown: String,
    pub content: String,
    pub force: bool,
    pub member_id: i64,
    pub action: HistoryAction,
}

#[derive(Debug, Clone)]
pub enum CommitResult {
    Committed {
        document: Document,
        history_id: Option<i64>,
        history_error: Option<String>,
    },
    Conflict {
        current: Document,
        markdown: String,
    },
}

pub struct VersionGuard<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub documents: &'a D,
    pub history: &'a H,
    pub record_history: bool,
}

impl<'a, D, H> VersionGuard<'a, D, H>
where
    D: DocumentRepository + ?Sized,
    H: HistoryRepository + ?Sized,
{
    pub async fn commit(
        &self,
        document: &Document,
        edit: ContentEdit,
    ) -> Result<CommitResult, DocumentError> {
        if !edit.force && edit.submitted_version != document.version {
            return self.conflict(document.id).await;
        }

        let prior = self
            .documents
            .get_content(document.id)
            .await?
            .unwrap_or_default();
        let commit = ContentCommit {
            document_id: document.id,
            expected_version: (!edit.force).then_some(document.version),
            new_version: next_version(document.version, Utc::now()),
            markdown: edit.markdown,
            content: edit.content,
        };
        let Some(committed) = self.documents.commit_content(&commit).await? else {
            // lost the compare-and-swap to a concurrent writer
            return self.conflict(document.id).await;
        };

        let (history_id, history_error) = if self.record_history {
            let recorder = HistoryRecorder { repo: self.history };
            match recorder
                .record(document, &prior, edit.action, edit.member_id)
                .await
            {
                Ok(id) => (Some(id), None),
                Err(e) => {
                    tracing::warn!(document_id = document.id, error = ?e, "history_record_failed");
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        tracing::debug!(
            document_id = committed.id,
            version = committed.version,
            forced = edit.force,
            "content_committed"
        );
        Ok(CommitResult::Committed {
            document: committed,
            history_id,
            history_error,
        })
    }

    async fn conflict(&self, document_id: i64) -> Result<CommitResult, DocumentError> {
        let current = self
            .documents
            .get_by_id(document_id)
            .await?
            .ok_or(DocumentError::NotFound("document"))?;
        let markdown = self
            .documents
            .get_content(document_id)
            .await?
            .map(|c| c.markdown)
            .unwrap_or_default();
        tracing::info!(
            document_id,
            server_version = current.version,
            "content_version_conflict"
        );
        Ok(CommitResult::Conflict { current, markdown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{MemoryDocuments, MemoryHistories, doc};
    use chrono::TimeZone;

    fn edit(version: i64, markdown: &str, force: bool) -> ContentEdit {
        ContentEdit {
            submitted_version: version,
            markdown: markdown.into(),
            content: format!("<p>{markdown}</p>"),
            force,
            member_id: 3,
            action: HistoryAction::Modify,
        }
    }

    #[test]
    fn next_version_is_strictly_monotonic() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(next_version(5, now), now.timestamp());
        let ahead = now.timestamp() + 100;
        assert_eq!(next_version(ahead, now), ahead + 1);
    }

    #[tokio::test]
    async fn stale_version_conflicts_unless_forced() {
        let mut d = doc(1, 10, "intro", "Intro");
        d.version = 5;
        let docs = MemoryDocuments::with(vec![d.clone()]);
        docs.set_content(1, "server", "<p>server</p>");
        let history = MemoryHistories::default();
        let guard = VersionGuard {
            documents: &docs,
            history: &history,
            record_history: true,
        };

        match guard.commit(&d, edit(4, "mine", false)).await.unwrap() {
            CommitResult::Conflict { current, markdown } => {
                assert_eq!(current.version, 5);
                assert_eq!(markdown, "server");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(docs.content(1).unwrap().markdown, "server");
        assert!(history.all().is_empty());

        match guard.commit(&d, edit(4, "mine", true)).await.unwrap() {
            CommitResult::Committed {
                document,
                history_id,
                history_error,
            } => {
                assert!(document.version > 5);
                assert!(history_id.is_some());
                assert!(history_error.is_none());
            }
            other => panic!("expected commit, got {other:?}"),
        }
        let stored = docs.content(1).unwrap();
        assert_eq!(stored.markdown, "mine");
        assert_eq!(stored.release, None);
        // history holds the state before the save
        assert_eq!(history.all()[0].markdown, "server");
        assert_eq!(history.all()[0].version, 5);
    }

    #[tokio::test]
    async fn second_writer_with_same_stamp_loses() {
        let d = doc(1, 10, "intro", "Intro");
        let docs = MemoryDocuments::with(vec![d.clone()]);
        let history = MemoryHistories::default();
        let guard = VersionGuard {
            documents: &docs,
            history: &history,
            record_history: false,
        };
        let first = guard.commit(&d, edit(1, "a", false)).await.unwrap();
        assert!(matches!(first, CommitResult::Committed { .. }));
        // same stale snapshot of the document
        let second = guard.commit(&d, edit(1, "b", false)).await.unwrap();
        assert!(matches!(second, CommitResult::Conflict { .. }));
        assert_eq!(docs.content(1).unwrap().markdown, "a");
        assert!(history.all().is_empty());
    }

    #[tokio::test]
    async fn history_failures_do_not_fail_the_commit() {
        let d = doc(1, 10, "intro", "Intro");
        let docs = MemoryDocuments::with(vec![d.clone()]);
        let history = MemoryHistories::failing();
        let guard = VersionGuard {
            documents: &docs,
            history: &history,
            record_history: true,
        };
        match guard.commit(&d, edit(1, "a", false)).await.unwrap() {
            CommitResult::Committed {
                history_id,
                history_error,
                ..
            } => {
                assert!(history_id.is_none());
                assert!(history_error.is_some());
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }
}
