use super::node::{ChildState, NodeKind, ProjectEntry, ProjectId, ProjectNode};
use crate::services::projects::ProjectRecord;
use std::collections::{HashMap, HashSet};

/// Normalized project forest
///
/// Projects are stored in a flat map keyed by id with an ordered list of
/// roots. The tree is a value: every update returns a new tree with a bumped
/// revision and leaves the receiver untouched, so holders can detect changes
/// by comparing trees or revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTree {
    /// All projects indexed by id
    nodes: HashMap<ProjectId, ProjectEntry>,
    /// Root ids in backend order
    roots: Vec<ProjectId>,
    /// Incremented by every update
    revision: u64,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from the `GET /projects` listing, keeping only roots
    pub fn from_records(records: Vec<ProjectRecord>) -> Self {
        Self::new().with_roots(records)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn roots(&self) -> &[ProjectId] {
        &self.roots
    }

    pub fn get(&self, id: &ProjectId) -> Option<&ProjectEntry> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &ProjectId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of projects currently in memory
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids from the root down to `id` (inclusive)
    pub fn ancestors(&self, id: &ProjectId) -> Vec<ProjectId> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(id);

        while let Some(entry) = current {
            chain.push(entry.id.clone());
            current = entry.parent.as_ref().and_then(|p| self.nodes.get(p));
        }

        chain.reverse();
        chain
    }

    /// Depth of a project (roots are 0)
    pub fn depth(&self, id: &ProjectId) -> usize {
        self.ancestors(id).len().saturating_sub(1)
    }

    /// Replace the whole forest with the roots found in `records`
    pub fn with_roots(&self, records: Vec<ProjectRecord>) -> Self {
        let mut next = Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            revision: self.revision + 1,
        };

        for record in records.into_iter().filter(ProjectRecord::is_root) {
            if next.nodes.contains_key(&record.id) {
                tracing::warn!("Duplicate root project id {} ignored", record.id);
                continue;
            }
            next.roots.push(record.id.clone());
            next.nodes.insert(
                record.id.clone(),
                ProjectEntry::new(record.id, record.name, NodeKind::Folder, record.created_at, None),
            );
        }

        next
    }

    /// Mark a project's children as in flight.
    ///
    /// Only a `NotLoaded` project moves to `Loading`; cached children stay
    /// visible while a refresh runs.
    pub fn with_loading(&self, id: &ProjectId) -> Self {
        let mut next = self.clone();
        if let Some(entry) = next.nodes.get_mut(id) {
            if entry.children == ChildState::NotLoaded {
                entry.children = ChildState::Loading;
            }
        }
        next.revision += 1;
        next
    }

    /// Record a failed child fetch: an in-flight project goes back to
    /// `NotLoaded`, cached children are kept.
    pub fn with_load_failed(&self, id: &ProjectId) -> Self {
        let mut next = self.clone();
        if let Some(entry) = next.nodes.get_mut(id) {
            if entry.children == ChildState::Loading {
                entry.children = ChildState::NotLoaded;
            }
        }
        next.revision += 1;
        next
    }

    /// Install a freshly fetched child list for `id`.
    ///
    /// Children that were already known keep their own cached subtrees,
    /// children that disappeared are dropped with their descendants. A child
    /// that is `id` itself, one of its ancestors, or a project living
    /// elsewhere in the forest is rejected so the forest stays a tree.
    pub fn with_children(&self, id: &ProjectId, records: Vec<ProjectRecord>) -> Self {
        let mut next = self.clone();
        next.revision += 1;

        let Some(parent) = next.nodes.get(id) else {
            tracing::debug!("Discarding sub-projects for unknown project {}", id);
            return next;
        };
        let old_children: Vec<ProjectId> = parent.children.ids().to_vec();
        let ancestors: HashSet<ProjectId> = next.ancestors(id).into_iter().collect();

        let mut child_ids = Vec::with_capacity(records.len());
        for record in records {
            if ancestors.contains(&record.id) {
                tracing::warn!(
                    "Project {} listed as a sub-project of its descendant {}, ignored",
                    record.id,
                    id
                );
                continue;
            }
            if child_ids.contains(&record.id) {
                tracing::warn!("Duplicate sub-project {} under {} ignored", record.id, id);
                continue;
            }
            if let Some(existing) = next.nodes.get(&record.id) {
                if existing.parent.as_ref() != Some(id) {
                    tracing::warn!(
                        "Sub-project {} of {} already present elsewhere in the tree, ignored",
                        record.id,
                        id
                    );
                    continue;
                }
            }
            child_ids.push(record.id.clone());

            match next.nodes.get_mut(&record.id) {
                Some(existing) => {
                    existing.name = record.name;
                    existing.created_at = record.created_at;
                }
                None => {
                    next.nodes.insert(
                        record.id.clone(),
                        ProjectEntry::new(
                            record.id,
                            record.name,
                            NodeKind::File,
                            record.created_at,
                            Some(id.clone()),
                        ),
                    );
                }
            }
        }

        for old in old_children {
            if !child_ids.contains(&old) {
                next.remove_subtree(&old);
            }
        }

        if let Some(parent) = next.nodes.get_mut(id) {
            parent.children = ChildState::Loaded(child_ids);
        }

        next
    }

    fn remove_subtree(&mut self, id: &ProjectId) {
        if let Some(entry) = self.nodes.remove(id) {
            for child in entry.children.ids() {
                self.remove_subtree(child);
            }
        }
    }

    /// Nested snapshot of one project and its loaded descendants
    pub fn node(&self, id: &ProjectId) -> Option<ProjectNode> {
        let entry = self.nodes.get(id)?;
        Some(ProjectNode {
            id: entry.id.clone(),
            name: entry.name.clone(),
            kind: entry.kind,
            children: entry
                .children
                .ids()
                .iter()
                .filter_map(|child| self.node(child))
                .collect(),
            load: entry.children.status(),
            created_at: entry.created_at.clone(),
        })
    }

    /// Nested snapshot of the whole forest
    pub fn forest(&self) -> Vec<ProjectNode> {
        self.roots.iter().filter_map(|id| self.node(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_tree::LoadStatus;

    fn sample_tree() -> ProjectTree {
        ProjectTree::from_records(vec![
            ProjectRecord::new(1, "Spring").with_created_at("2024-03-01T09:00:00Z"),
            ProjectRecord::new(2, "Fall").with_created_at("2024-09-01T09:00:00Z"),
            ProjectRecord::new(7, "Nested").with_parent(1),
        ])
    }

    fn id(n: i64) -> ProjectId {
        ProjectId::from(n)
    }

    #[test]
    fn test_from_records_keeps_only_roots() {
        let tree = sample_tree();

        assert_eq!(tree.roots(), &[id(1), id(2)]);
        assert_eq!(tree.len(), 2);
        assert!(!tree.contains(&id(7)));

        let spring = tree.get(&id(1)).unwrap();
        assert_eq!(spring.kind, NodeKind::Folder);
        assert_eq!(spring.children, ChildState::NotLoaded);
    }

    #[test]
    fn test_duplicate_roots_are_dropped() {
        let tree = ProjectTree::from_records(vec![
            ProjectRecord::new(1, "Spring"),
            ProjectRecord::new(1, "Spring again"),
        ]);

        assert_eq!(tree.roots().len(), 1);
        assert_eq!(tree.get(&id(1)).unwrap().name, "Spring");
    }

    #[test]
    fn test_with_children_is_an_immutable_update() {
        let tree = sample_tree();
        let next = tree.with_children(&id(1), vec![ProjectRecord::new(3, "Jacket")]);

        // Original untouched
        assert_eq!(tree.get(&id(1)).unwrap().children, ChildState::NotLoaded);
        assert!(!tree.contains(&id(3)));

        assert!(next.revision() > tree.revision());
        assert_eq!(next.get(&id(1)).unwrap().children.ids(), &[id(3)]);

        let jacket = next.get(&id(3)).unwrap();
        assert_eq!(jacket.kind, NodeKind::File);
        assert_eq!(jacket.parent, Some(id(1)));
        assert_eq!(jacket.children, ChildState::NotLoaded);
        assert_ne!(tree, next);
    }

    #[test]
    fn test_loading_and_failure_transitions() {
        let tree = sample_tree().with_loading(&id(1));
        assert!(tree.get(&id(1)).unwrap().is_loading());

        let failed = tree.with_load_failed(&id(1));
        assert_eq!(failed.get(&id(1)).unwrap().children, ChildState::NotLoaded);
    }

    #[test]
    fn test_refresh_keeps_cached_children_visible() {
        let tree = sample_tree().with_children(&id(1), vec![ProjectRecord::new(3, "Jacket")]);

        let refreshing = tree.with_loading(&id(1));
        assert_eq!(refreshing.get(&id(1)).unwrap().children.ids(), &[id(3)]);

        let failed = refreshing.with_load_failed(&id(1));
        assert_eq!(failed.get(&id(1)).unwrap().children.ids(), &[id(3)]);
    }

    #[test]
    fn test_refetch_merges_and_prunes() {
        let tree = sample_tree()
            .with_children(
                &id(1),
                vec![ProjectRecord::new(3, "Jacket"), ProjectRecord::new(4, "Skirt")],
            )
            .with_children(&id(3), vec![ProjectRecord::new(5, "Sleeve")]);
        assert_eq!(tree.len(), 5);

        // Jacket renamed, Skirt gone, Coat new
        let next = tree.with_children(
            &id(1),
            vec![ProjectRecord::new(3, "Jacket v2"), ProjectRecord::new(6, "Coat")],
        );

        assert_eq!(next.get(&id(1)).unwrap().children.ids(), &[id(3), id(6)]);
        assert_eq!(next.get(&id(3)).unwrap().name, "Jacket v2");
        // Jacket keeps its cached subtree
        assert_eq!(next.get(&id(3)).unwrap().children.ids(), &[id(5)]);
        assert!(!next.contains(&id(4)));
    }

    #[test]
    fn test_removed_child_drops_descendants() {
        let tree = sample_tree()
            .with_children(&id(1), vec![ProjectRecord::new(3, "Jacket")])
            .with_children(&id(3), vec![ProjectRecord::new(5, "Sleeve")]);

        let next = tree.with_children(&id(1), Vec::new());

        assert!(!next.contains(&id(3)));
        assert!(!next.contains(&id(5)));
        assert_eq!(next.get(&id(1)).unwrap().children, ChildState::Loaded(Vec::new()));
    }

    #[test]
    fn test_cycles_and_foreign_ids_are_rejected() {
        let tree = sample_tree().with_children(&id(1), vec![ProjectRecord::new(3, "Jacket")]);

        let next = tree.with_children(
            &id(3),
            vec![
                ProjectRecord::new(1, "Spring"), // ancestor
                ProjectRecord::new(3, "Jacket"), // itself
                ProjectRecord::new(2, "Fall"),   // another root
                ProjectRecord::new(8, "Cuff"),
                ProjectRecord::new(8, "Cuff"), // duplicate
            ],
        );

        assert_eq!(next.get(&id(3)).unwrap().children.ids(), &[id(8)]);
        assert_eq!(next.get(&id(2)).unwrap().parent, None);
        assert_eq!(next.forest().len(), 2);
    }

    #[test]
    fn test_children_for_unknown_project_are_discarded() {
        let tree = sample_tree();
        let next = tree.with_children(&id(99), vec![ProjectRecord::new(3, "Jacket")]);

        assert!(!next.contains(&id(3)));
        assert_eq!(next.len(), tree.len());
    }

    #[test]
    fn test_ancestors_and_depth() {
        let tree = sample_tree()
            .with_children(&id(1), vec![ProjectRecord::new(3, "Jacket")])
            .with_children(&id(3), vec![ProjectRecord::new(5, "Sleeve")]);

        assert_eq!(tree.ancestors(&id(5)), vec![id(1), id(3), id(5)]);
        assert_eq!(tree.depth(&id(1)), 0);
        assert_eq!(tree.depth(&id(3)), 1);
        assert_eq!(tree.depth(&id(5)), 2);
        assert!(tree.ancestors(&id(42)).is_empty());
    }

    #[test]
    fn test_forest_snapshot() {
        let tree = sample_tree()
            .with_loading(&id(2))
            .with_children(&id(1), vec![ProjectRecord::new(3, "Jacket").with_created_at("2024-05-01")]);

        let forest = tree.forest();

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "Spring");
        assert_eq!(forest[0].load, LoadStatus::Loaded);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].name, "Jacket");
        assert_eq!(forest[0].children[0].created_at.as_deref(), Some("2024-05-01"));
        assert_eq!(forest[1].load, LoadStatus::Loading);
        assert!(forest[1].children.is_empty());
    }
}
