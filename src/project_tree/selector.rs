//! Project tree selector
//!
//! The container behind every "link to project" picker. It owns the project
//! forest, the search and date-filter inputs, and per-item expansion, and it
//! forwards selections to the consumer after refreshing the chosen project's
//! children.
//!
//! Fetches are split into three steps so an event loop can stay responsive
//! while they run:
//!
//! 1. a `*_request` method updates local state and returns a [`FetchTicket`]
//!    when the API must be called,
//! 2. [`FetchTicket::run`] performs the call (on any task),
//! 3. [`ProjectTreeSelector::apply`] integrates the resulting
//!    [`SelectorMessage`].
//!
//! `mount`, `toggle` and `select` chain the three steps for callers that can
//! simply await.
//!
//! Fetch failures never escape the selector: they are logged and the view
//! shows whatever data it already had.

use super::filter::{filter_by_date, filter_by_name};
use super::folder::FolderTree;
use super::item::{needs_fetch, ItemState, ItemStates, SelectionProps, TreeItem};
use super::node::{ProjectId, ProjectNode};
use super::tree::ProjectTree;
use crate::config::SelectorConfig;
use crate::services::projects::{FetchError, ProjectRecord, ProjectsManager};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Callback receiving the project the user picked
pub type OnSelect = Box<dyn FnMut(&ProjectNode) + Send>;

/// Which inputs the selector exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorOptions {
    pub show_search: bool,
    pub show_date_filter: bool,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            show_search: true,
            show_date_filter: false,
        }
    }
}

impl From<&SelectorConfig> for SelectorOptions {
    fn from(config: &SelectorConfig) -> Self {
        Self {
            show_search: config.show_search,
            show_date_filter: config.show_date_filter,
        }
    }
}

/// Why children are being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    /// First expansion of a project
    Expand,
    /// Refresh before handing a selection to the consumer
    Select,
}

/// An API call the selector needs made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTicket {
    Roots,
    Children {
        id: ProjectId,
        purpose: FetchPurpose,
        /// Issue order, used to drop results overtaken by a newer fetch
        seq: u64,
    },
}

impl FetchTicket {
    /// Perform the call and package the outcome for [`ProjectTreeSelector::apply`]
    pub async fn run(self, manager: &ProjectsManager) -> SelectorMessage {
        match self {
            FetchTicket::Roots => SelectorMessage::RootsLoaded(manager.list_projects().await),
            FetchTicket::Children { id, purpose, seq } => {
                let result = match purpose {
                    FetchPurpose::Expand => manager.list_sub_projects(&id).await,
                    FetchPurpose::Select => manager.refresh_sub_projects(&id).await,
                };
                SelectorMessage::ChildrenLoaded {
                    id,
                    purpose,
                    seq,
                    result,
                }
            }
        }
    }
}

/// Result of a [`FetchTicket`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorMessage {
    RootsLoaded(Result<Vec<ProjectRecord>, FetchError>),
    ChildrenLoaded {
        id: ProjectId,
        purpose: FetchPurpose,
        seq: u64,
        result: Result<Vec<ProjectRecord>, FetchError>,
    },
}

pub struct ProjectTreeSelector {
    manager: ProjectsManager,
    tree: ProjectTree,
    items: ItemStates,
    search: String,
    filter_date: String,
    options: SelectorOptions,
    selection: SelectionProps,
    on_select: OnSelect,
    /// Last issued child-fetch sequence number
    fetch_seq: u64,
    /// Sequence number of the newest child list installed per project
    installed: HashMap<ProjectId, u64>,
}

impl fmt::Debug for ProjectTreeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectTreeSelector")
            .field("tree", &self.tree)
            .field("items", &self.items)
            .field("search", &self.search)
            .field("filter_date", &self.filter_date)
            .field("options", &self.options)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl ProjectTreeSelector {
    pub fn new<F>(manager: ProjectsManager, on_select: F) -> Self
    where
        F: FnMut(&ProjectNode) + Send + 'static,
    {
        Self {
            manager,
            tree: ProjectTree::new(),
            items: ItemStates::new(),
            search: String::new(),
            filter_date: String::new(),
            options: SelectorOptions::default(),
            selection: SelectionProps::new(),
            on_select: Box::new(on_select),
            fetch_seq: 0,
            installed: HashMap::new(),
        }
    }

    /// Selector over a single, already known project (no mount fetch needed)
    pub fn for_project<F>(manager: ProjectsManager, project: ProjectRecord, on_select: F) -> Self
    where
        F: FnMut(&ProjectNode) + Send + 'static,
    {
        let mut selector = Self::new(manager, on_select).with_options(SelectorOptions {
            show_search: false,
            show_date_filter: false,
        });
        let root = ProjectRecord {
            parent_id: None,
            ..project
        };
        selector.tree = ProjectTree::from_records(vec![root]);
        selector
    }

    pub fn with_options(mut self, options: SelectorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_selection(mut self, selection: SelectionProps) -> Self {
        self.selection = selection;
        self
    }

    pub fn manager(&self) -> &ProjectsManager {
        &self.manager
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    pub fn options(&self) -> SelectorOptions {
        self.options
    }

    pub fn selection(&self) -> &SelectionProps {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: SelectionProps) {
        self.selection = selection;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    pub fn filter_date(&self) -> &str {
        &self.filter_date
    }

    pub fn set_filter_date(&mut self, date: &str) {
        self.filter_date = date.to_string();
    }

    pub fn is_expanded(&self, id: &ProjectId) -> bool {
        self.items.is_expanded(id)
    }

    /// Current snapshot of one project, unfiltered
    pub fn node(&self, id: &ProjectId) -> Option<ProjectNode> {
        self.tree.node(id)
    }

    /// Start loading the root projects
    pub fn mount_request(&mut self) -> FetchTicket {
        FetchTicket::Roots
    }

    /// Expand or collapse a project.
    ///
    /// Expanding a never-fetched project returns a ticket for its children;
    /// the item is expanded right away either way. Collapsing keeps the
    /// cached children.
    pub fn toggle_request(&mut self, id: &ProjectId) -> Option<FetchTicket> {
        let load = self.tree.get(id)?.children.status();

        match self.items.toggle(id) {
            ItemState::Collapsed => None,
            ItemState::Expanded if needs_fetch(load) => {
                self.tree = self.tree.with_loading(id);
                Some(FetchTicket::Children {
                    id: id.clone(),
                    purpose: FetchPurpose::Expand,
                    seq: self.next_seq(),
                })
            }
            ItemState::Expanded => None,
        }
    }

    /// Select a project.
    ///
    /// A linked project is not selectable and yields nothing. Any other
    /// project always gets its children refetched before the selection is
    /// forwarded, cached or not.
    pub fn select_request(&mut self, id: &ProjectId) -> Option<FetchTicket> {
        if !self.tree.contains(id) {
            return None;
        }
        if self.selection.is_linked(id) {
            tracing::debug!("Ignoring selection of linked project {}", id);
            return None;
        }

        self.tree = self.tree.with_loading(id);
        Some(FetchTicket::Children {
            id: id.clone(),
            purpose: FetchPurpose::Select,
            seq: self.next_seq(),
        })
    }

    fn next_seq(&mut self) -> u64 {
        self.fetch_seq += 1;
        self.fetch_seq
    }

    /// Integrate a fetch result.
    ///
    /// Child lists can arrive out of order; one older than the list already
    /// installed for that project is dropped. For a selection refresh this
    /// invokes the `on_select` callback (even when the refresh failed or was
    /// overtaken) and returns the selected project.
    pub fn apply(&mut self, message: SelectorMessage) -> Option<ProjectNode> {
        match message {
            SelectorMessage::RootsLoaded(Ok(records)) => {
                self.tree = self.tree.with_roots(records);
                self.installed.clear();
                tracing::debug!("Loaded {} root projects", self.tree.roots().len());
                None
            }
            SelectorMessage::RootsLoaded(Err(e)) => {
                tracing::error!("Failed to load projects: {}", e);
                None
            }
            SelectorMessage::ChildrenLoaded {
                id,
                purpose,
                seq,
                result,
            } => {
                let overtaken = self.installed.get(&id).is_some_and(|&newest| newest > seq);
                match result {
                    _ if overtaken => {
                        tracing::debug!(
                            "Dropping outdated sub-projects of {} (fetch {})",
                            id,
                            seq
                        );
                    }
                    Ok(records) => {
                        tracing::debug!("Loaded {} sub-projects of {}", records.len(), id);
                        self.tree = self.tree.with_children(&id, records);
                        self.installed.insert(id.clone(), seq);
                    }
                    Err(e) => {
                        tracing::error!("Failed to load sub-projects of {}: {}", id, e);
                        self.tree = self.tree.with_load_failed(&id);
                    }
                }

                if purpose != FetchPurpose::Select {
                    return None;
                }
                let Some(node) = self.tree.node(&id) else {
                    tracing::debug!("Selected project {} is no longer in the tree", id);
                    return None;
                };
                (self.on_select)(&node);
                Some(node)
            }
        }
    }

    /// Fetch and install the root projects
    pub async fn mount(&mut self) {
        let ticket = self.mount_request();
        self.run_ticket(ticket).await;
    }

    /// Expand/collapse `id`, awaiting the child fetch if one is needed
    pub async fn toggle(&mut self, id: &ProjectId) {
        if let Some(ticket) = self.toggle_request(id) {
            self.run_ticket(ticket).await;
        }
    }

    /// Select `id`, awaiting the refresh. Returns the forwarded project, or
    /// None if the project is linked or unknown.
    pub async fn select(&mut self, id: &ProjectId) -> Option<ProjectNode> {
        let ticket = self.select_request(id)?;
        self.run_ticket(ticket).await
    }

    async fn run_ticket(&mut self, ticket: FetchTicket) -> Option<ProjectNode> {
        let manager = self.manager.clone();
        let message = ticket.run(&manager).await;
        self.apply(message)
    }

    /// The forest after applying the active filters, rebuilt from the full
    /// tree on every call
    pub fn visible_forest(&self) -> Vec<ProjectNode> {
        let mut forest = self.tree.forest();
        if self.options.show_search {
            forest = refine(forest, |nodes| filter_by_name(nodes, &self.search));
        }
        if self.options.show_date_filter {
            forest = refine(forest, |nodes| filter_by_date(nodes, &self.filter_date));
        }
        forest
    }

    /// Visible rows in display order
    pub fn rows(&self) -> Vec<TreeItem> {
        FolderTree::rows(&self.visible_forest(), &self.items, &self.selection)
    }
}

/// Replace `forest` with a filter's output unless the filter was a passthrough
fn refine<F>(forest: Vec<ProjectNode>, filter: F) -> Vec<ProjectNode>
where
    F: for<'a> Fn(&'a [ProjectNode]) -> Cow<'a, [ProjectNode]>,
{
    let filtered = match filter(&forest) {
        Cow::Borrowed(_) => None,
        Cow::Owned(nodes) => Some(nodes),
    };
    filtered.unwrap_or(forest)
}
