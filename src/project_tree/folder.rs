use super::item::{ItemStates, SelectionProps, TreeItem};
use super::node::ProjectNode;

/// Lays out a list of root projects as visible rows.
pub struct FolderTree;

impl FolderTree {
    /// Rows in display order: each item followed by its children while it
    /// is expanded and has any.
    pub fn rows(
        roots: &[ProjectNode],
        states: &ItemStates,
        selection: &SelectionProps,
    ) -> Vec<TreeItem> {
        let mut rows = Vec::new();
        for node in roots {
            Self::collect(node, 0, states, selection, &mut rows);
        }
        rows
    }

    fn collect(
        node: &ProjectNode,
        depth: usize,
        states: &ItemStates,
        selection: &SelectionProps,
        rows: &mut Vec<TreeItem>,
    ) {
        let item = TreeItem::new(node, depth, states, selection);
        let shows_children = item.shows_children();
        rows.push(item);

        if shows_children {
            for child in &node.children {
                Self::collect(child, depth + 1, states, selection, rows);
            }
        }
    }
}
