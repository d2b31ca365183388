//! Terminal rendering

pub mod project_explorer;

pub use project_explorer::ProjectExplorerRenderer;
