//! Link stage of outline reconciliation.
//!
//! Contract: `link_parents` runs on the output of `linkgraph::resolve`, after
//! every outline identifier has a document row. Anchors created after the
//! resolve stage are looked up in the refreshed `IdentifierMap`.

use std::collections::{HashMap, HashSet};

use crate::application::linkgraph::{self, IdentifierMap, LINK_SIGIL, ResolvedHtml};
use crate::application::services::outline;
use crate::domain::documents::document::{ROOT_PARENT_ID, TreePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    InvalidIdentifier,
    NumericIdentifier,
    Unresolved,
    UnresolvedParent,
    Cycle,
    Storage,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidIdentifier => "invalid_identifier",
            FailureReason::NumericIdentifier => "numeric_identifier",
            FailureReason::Unresolved => "unresolved",
            FailureReason::UnresolvedParent => "unresolved_parent",
            FailureReason::Cycle => "cycle",
            FailureReason::Storage => "storage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileFailure {
    pub identifier: String,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Default)]
pub struct LinkPlan {
    pub positions: Vec<TreePosition>,
    pub failures: Vec<ReconcileFailure>,
}

pub fn link_parents(resolved: &ResolvedHtml, map: &IdentifierMap) -> LinkPlan {
    let mut plan = LinkPlan::default();
    let mut seen = HashSet::new();

    for entry in outline::entries(&resolved.anchors) {
        let Some(anchor) = resolved.anchors.get(entry.position) else {
            continue;
        };
        let Some(document_id) = linkgraph::anchor_document_id(resolved, map, anchor) else {
            tracing::warn!(identifier = %entry.identifier, "outline_entry_unresolved");
            plan.failures.push(ReconcileFailure {
                identifier: entry.identifier,
                reason: FailureReason::Unresolved,
            });
            continue;
        };
        // first listing wins
        if !seen.insert(document_id) {
            continue;
        }

        let parent_anchor = anchor
            .parent_item_anchor()
            .and_then(|pos| resolved.anchors.get(pos))
            .filter(|a| a.symbolic_target(LINK_SIGIL).is_some());
        let parent_id = match parent_anchor {
            None => ROOT_PARENT_ID,
            Some(parent) => match linkgraph::anchor_document_id(resolved, map, parent) {
                Some(id) => id,
                None => {
                    tracing::warn!(identifier = %entry.identifier, "outline_parent_unresolved");
                    plan.failures.push(ReconcileFailure {
                        identifier: entry.identifier,
                        reason: FailureReason::UnresolvedParent,
                    });
                    continue;
                }
            },
        };
        if parent_id == document_id {
            plan.failures.push(ReconcileFailure {
                identifier: entry.identifier,
                reason: FailureReason::Cycle,
            });
            continue;
        }

        let name = Some(entry.display_text).filter(|t| !t.is_empty());
        plan.positions.push(TreePosition {
            document_id,
            parent_id,
            name,
            order_index: entry.position as i32,
        });
    }

    drop_cycles(&mut plan);
    plan
}

/// Removes positions whose planned parent chain loops back to themselves.
fn drop_cycles(plan: &mut LinkPlan) {
    let parents: HashMap<i64, i64> = plan
        .positions
        .iter()
        .map(|p| (p.document_id, p.parent_id))
        .collect();
    let in_cycle = |start: i64| {
        let mut visited = HashSet::new();
        let mut current = start;
        while let Some(&parent) = parents.get(&current) {
            if parent == start {
                return true;
            }
            if !visited.insert(parent) {
                return false;
            }
            current = parent;
        }
        false
    };
    let cyclic: HashSet<i64> = parents.keys().copied().filter(|id| in_cycle(*id)).collect();
    if cyclic.is_empty() {
        return;
    }
    let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut plan.positions)
        .into_iter()
        .partition(|p| !cyclic.contains(&p.document_id));
    plan.positions = kept;
    plan.failures
        .extend(dropped.into_iter().map(|p| ReconcileFailure {
            identifier: p.document_id.to_string(),
            reason: FailureReason::Cycle,
        }));
}
