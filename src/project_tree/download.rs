//! Checkbox selection for exporting a project together with chosen sub-projects
//!
//! The main project is always part of the export and cannot be unchecked.
//! "Select all" spans every other project in the loaded forest.

use super::node::{ProjectId, ProjectNode};
use serde::Serialize;

/// State of the "select all" checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectAllState {
    Unchecked,
    Indeterminate,
    Checked,
}

impl SelectAllState {
    pub fn checkbox(&self) -> &'static str {
        match self {
            SelectAllState::Unchecked => "[ ]",
            SelectAllState::Indeterminate => "[-]",
            SelectAllState::Checked => "[x]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSelection {
    main: ProjectId,
    selected: Vec<ProjectId>,
}

impl DownloadSelection {
    pub fn new(main: impl Into<ProjectId>) -> Self {
        Self {
            main: main.into(),
            selected: Vec::new(),
        }
    }

    pub fn main(&self) -> &ProjectId {
        &self.main
    }

    /// Checked projects other than the main one, in the order they were checked
    pub fn selected(&self) -> &[ProjectId] {
        &self.selected
    }

    pub fn is_main(&self, id: &ProjectId) -> bool {
        &self.main == id
    }

    pub fn is_checked(&self, id: &ProjectId) -> bool {
        self.is_main(id) || self.selected.contains(id)
    }

    /// Flip one checkbox. Returns false for the main project, which stays checked.
    pub fn toggle(&mut self, id: &ProjectId) -> bool {
        if self.is_main(id) {
            return false;
        }
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.clone());
        }
        true
    }

    /// Check every project in `forest` except the main one
    pub fn select_all(&mut self, forest: &[ProjectNode]) {
        for id in self.selectable_ids(forest) {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Act on the "select all" checkbox: clears when everything is checked,
    /// checks everything otherwise
    pub fn toggle_all(&mut self, forest: &[ProjectNode]) {
        match self.select_all_state(forest) {
            SelectAllState::Checked => self.clear(),
            SelectAllState::Unchecked | SelectAllState::Indeterminate => self.select_all(forest),
        }
    }

    pub fn select_all_state(&self, forest: &[ProjectNode]) -> SelectAllState {
        let selectable = self.selectable_ids(forest);
        let checked = selectable
            .iter()
            .filter(|id| self.selected.contains(id))
            .count();

        if checked == 0 {
            SelectAllState::Unchecked
        } else if checked == selectable.len() {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }

    /// Ids to export: the main project first, then the checked ones
    pub fn included_ids(&self) -> Vec<ProjectId> {
        std::iter::once(self.main.clone())
            .chain(self.selected.iter().cloned())
            .collect()
    }

    fn selectable_ids(&self, forest: &[ProjectNode]) -> Vec<ProjectId> {
        let mut ids = Vec::new();
        collect_ids(forest, &mut ids);
        ids.retain(|id| !self.is_main(id));
        ids
    }
}

fn collect_ids(nodes: &[ProjectNode], ids: &mut Vec<ProjectId>) {
    for node in nodes {
        ids.push(node.id.clone());
        collect_ids(&node.children, ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_tree::NodeKind;

    fn forest() -> Vec<ProjectNode> {
        vec![
            ProjectNode::leaf(1, "Spring", NodeKind::Folder).with_children(vec![
                ProjectNode::leaf(3, "Jacket", NodeKind::File)
                    .with_children(vec![ProjectNode::leaf(5, "Sleeve", NodeKind::File)]),
                ProjectNode::leaf(4, "Skirt", NodeKind::File),
            ]),
        ]
    }

    fn id(n: i64) -> ProjectId {
        ProjectId::from(n)
    }

    #[test]
    fn test_main_project_always_included() {
        let mut selection = DownloadSelection::new(1);

        assert!(!selection.toggle(&id(1)));
        assert!(selection.is_checked(&id(1)));
        assert_eq!(selection.included_ids(), vec![id(1)]);
    }

    #[test]
    fn test_toggle_sub_projects() {
        let mut selection = DownloadSelection::new(1);

        assert!(selection.toggle(&id(4)));
        assert!(selection.toggle(&id(3)));
        assert_eq!(selection.included_ids(), vec![id(1), id(4), id(3)]);

        selection.toggle(&id(4));
        assert!(!selection.is_checked(&id(4)));
        assert_eq!(selection.included_ids(), vec![id(1), id(3)]);
    }

    #[test]
    fn test_select_all_state_transitions() {
        let forest = forest();
        let mut selection = DownloadSelection::new(1);
        assert_eq!(selection.select_all_state(&forest), SelectAllState::Unchecked);

        selection.toggle(&id(5));
        assert_eq!(
            selection.select_all_state(&forest),
            SelectAllState::Indeterminate
        );

        selection.select_all(&forest);
        assert_eq!(selection.select_all_state(&forest), SelectAllState::Checked);
        assert_eq!(selection.included_ids(), vec![id(1), id(5), id(3), id(4)]);
    }

    #[test]
    fn test_toggle_all_clears_when_full() {
        let forest = forest();
        let mut selection = DownloadSelection::new(1);

        selection.toggle_all(&forest);
        assert_eq!(selection.selected().len(), 3);

        selection.toggle_all(&forest);
        assert!(selection.selected().is_empty());
        assert_eq!(selection.included_ids(), vec![id(1)]);
    }

    #[test]
    fn test_nothing_selectable_is_unchecked() {
        let forest = vec![ProjectNode::leaf(1, "Spring", NodeKind::Folder)];
        let selection = DownloadSelection::new(1);

        assert_eq!(selection.select_all_state(&forest), SelectAllState::Unchecked);
    }
}
