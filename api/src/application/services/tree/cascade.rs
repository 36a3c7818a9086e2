use std::collections::HashSet;

use super::index_children;
use crate::domain::documents::document::Document;

/// `root_id` followed by all of its descendants, depth-first. Ids already
/// visited are skipped so a corrupted parent chain cannot loop forever.
pub fn collect_subtree(documents: &[Document], root_id: i64) -> Vec<i64> {
    let children = index_children(documents);
    let mut visited = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![root_id];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        out.push(id);
        if let Some(kids) = children.get(&id) {
            stack.extend(kids.iter().rev().map(|d| d.id));
        }
    }
    out
}
