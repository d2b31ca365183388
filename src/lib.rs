// Project tree library - exposes the model, selector and services for the
// terminal picker and for tests

pub mod config;
pub mod project_tree;
pub mod services;

#[cfg(feature = "runtime")]
pub mod app;
#[cfg(feature = "runtime")]
pub mod ui;
