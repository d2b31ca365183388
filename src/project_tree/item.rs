use super::node::{LoadStatus, NodeKind, ProjectId, ProjectNode};
use std::collections::HashSet;

/// Expand/collapse state of one tree item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemState {
    #[default]
    Collapsed,
    Expanded,
}

/// Expansion state of every item, keyed by project id.
///
/// Items that were never toggled are collapsed. The state outlives filtering:
/// an item hidden by a search comes back in whatever state it had.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemStates {
    expanded: HashSet<ProjectId>,
}

impl ItemStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &ProjectId) -> ItemState {
        if self.expanded.contains(id) {
            ItemState::Expanded
        } else {
            ItemState::Collapsed
        }
    }

    pub fn is_expanded(&self, id: &ProjectId) -> bool {
        self.expanded.contains(id)
    }

    pub fn set(&mut self, id: &ProjectId, state: ItemState) {
        match state {
            ItemState::Expanded => {
                self.expanded.insert(id.clone());
            }
            ItemState::Collapsed => {
                self.expanded.remove(id);
            }
        }
    }

    /// Flip an item and return its new state
    pub fn toggle(&mut self, id: &ProjectId) -> ItemState {
        let next = match self.state(id) {
            ItemState::Collapsed => ItemState::Expanded,
            ItemState::Expanded => ItemState::Collapsed,
        };
        self.set(id, next);
        next
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}

/// Selection inputs supplied by the consumer, normalized to bare ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionProps {
    /// Project picked in this session
    pub selected: Option<ProjectId>,
    /// Project already associated with the entity being edited
    pub linked: Option<ProjectId>,
}

impl SelectionProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts anything that names a project: an id, a string, an integer or a node
    pub fn with_selected(mut self, selected: impl Into<ProjectId>) -> Self {
        self.selected = Some(selected.into());
        self
    }

    pub fn with_linked(mut self, linked: impl Into<ProjectId>) -> Self {
        self.linked = Some(linked.into());
        self
    }

    pub fn is_linked(&self, id: &ProjectId) -> bool {
        self.linked.as_ref() == Some(id)
    }

    pub fn is_selected(&self, id: &ProjectId) -> bool {
        self.selected.as_ref() == Some(id)
    }
}

/// Whether expanding a project with this child status must hit the API.
///
/// Only a never-fetched project is fetched; loaded children (even an empty
/// list) are a cache hit and an in-flight fetch is not repeated.
pub fn needs_fetch(load: LoadStatus) -> bool {
    load == LoadStatus::NotLoaded
}

/// One row of the project tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub id: ProjectId,
    pub name: String,
    pub kind: NodeKind,
    pub created_at: Option<String>,
    /// Nesting level (roots are 0)
    pub depth: usize,
    pub state: ItemState,
    pub load: LoadStatus,
    /// Children surviving the current filters
    pub child_count: usize,
    pub linked: bool,
    pub selected: bool,
}

impl TreeItem {
    pub fn new(
        node: &ProjectNode,
        depth: usize,
        states: &ItemStates,
        selection: &SelectionProps,
    ) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            created_at: node.created_at.clone(),
            depth,
            state: states.state(&node.id),
            load: node.load,
            child_count: node.children.len(),
            linked: selection.is_linked(&node.id),
            selected: selection.is_selected(&node.id),
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.state == ItemState::Expanded
    }

    pub fn is_loading(&self) -> bool {
        self.load == LoadStatus::Loading
    }

    /// Children are listed only while expanded and non-empty
    pub fn shows_children(&self) -> bool {
        self.is_expanded() && self.child_count > 0
    }

    /// Linked rows swallow the select action
    pub fn can_select(&self) -> bool {
        !self.linked
    }

    pub fn select_label(&self) -> &'static str {
        if self.linked {
            "Selected"
        } else {
            "Select"
        }
    }

    /// Expansion marker drawn before the name
    pub fn indicator(&self) -> &'static str {
        if self.is_loading() {
            "⟳ "
        } else if self.is_expanded() {
            "▼ "
        } else {
            "▶ "
        }
    }
}
