//! Lazily loaded project forest with live filtering and single selection

pub mod download;
pub mod filter;
pub mod folder;
pub mod item;
pub mod node;
pub mod selector;
pub mod tree;

pub use download::{DownloadSelection, SelectAllState};
pub use filter::{filter_by_date, filter_by_name};
pub use folder::FolderTree;
pub use item::{needs_fetch, ItemState, ItemStates, SelectionProps, TreeItem};
pub use node::{
    find_in_forest, ChildState, LoadStatus, NodeKind, ProjectEntry, ProjectId, ProjectNode,
};
pub use selector::{
    FetchPurpose, FetchTicket, OnSelect, ProjectTreeSelector, SelectorMessage, SelectorOptions,
};
pub use tree::ProjectTree;
