//! Forest pruning by name or creation date
//!
//! Both filters keep a node when it matches or when any descendant survives,
//! so every match stays reachable through its ancestors. An empty query is a
//! passthrough that borrows the input instead of copying it.

use super::node::ProjectNode;
use std::borrow::Cow;

/// Keep nodes whose name contains `query` (case-insensitive), plus their ancestors
pub fn filter_by_name<'a>(nodes: &'a [ProjectNode], query: &str) -> Cow<'a, [ProjectNode]> {
    if query.is_empty() {
        return Cow::Borrowed(nodes);
    }
    let needle = query.to_lowercase();
    Cow::Owned(prune(nodes, &|node| node.name.to_lowercase().contains(&needle)))
}

/// Keep nodes created on a day starting with `date_prefix` (e.g. `2024-05-01`),
/// plus their ancestors. Nodes without `created_at` never match.
pub fn filter_by_date<'a>(nodes: &'a [ProjectNode], date_prefix: &str) -> Cow<'a, [ProjectNode]> {
    if date_prefix.is_empty() {
        return Cow::Borrowed(nodes);
    }
    Cow::Owned(prune(nodes, &|node| {
        node.created_at
            .as_deref()
            .is_some_and(|created| created.starts_with(date_prefix))
    }))
}

fn prune(nodes: &[ProjectNode], matches: &dyn Fn(&ProjectNode) -> bool) -> Vec<ProjectNode> {
    nodes
        .iter()
        .filter_map(|node| {
            let children = prune(&node.children, matches);
            if matches(node) || !children.is_empty() {
                Some(ProjectNode {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kind: node.kind,
                    children,
                    load: node.load,
                    created_at: node.created_at.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}
