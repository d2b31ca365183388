// Projects service: async, pluggable access to the project-listing API
//
// The selector only ever talks to a ProjectsManager. The manager wraps a
// ProjectsBackend (HTTP in production, in-memory for fixtures and tests).

pub mod backend;
pub mod http;
pub mod manager;
pub mod memory;
pub mod slow;

pub use backend::{Envelope, FetchError, ProjectRecord, ProjectsBackend};
pub use http::HttpProjectsBackend;
pub use manager::ProjectsManager;
pub use memory::{BackendRequest, InMemoryProjectsBackend};
pub use slow::{BackendMetrics, SlowBackendConfig, SlowProjectsBackend};
