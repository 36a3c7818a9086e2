pub mod cascade;
pub mod export;
pub mod reconcile;

use std::collections::HashMap;

use crate::domain::documents::document::Document;

/// Children of every parent id, siblings ordered by (order_index, id).
pub(crate) fn index_children(documents: &[Document]) -> HashMap<i64, Vec<&Document>> {
    let mut children: HashMap<i64, Vec<&Document>> = HashMap::new();
    for doc in documents {
        children.entry(doc.parent_id).or_default().push(doc);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|d| (d.order_index, d.id));
    }
    children
}
