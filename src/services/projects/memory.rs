//! In-memory projects backend
//!
//! Serves a fixed set of project records, deriving sub-project listings from
//! `parent_id`. Used by the `--fixture` mode of the binary and by tests, which
//! also use its request log and failure injection.

use super::backend::{Envelope, FetchError, ProjectRecord, ProjectsBackend};
use crate::project_tree::ProjectId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One call made against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    ListProjects,
    ListSubProjects(ProjectId),
    GetProject(ProjectId),
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<ProjectRecord>,
    requests: Vec<BackendRequest>,
    fail_list: bool,
    failing_ids: HashSet<ProjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectsBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryProjectsBackend {
    pub fn new(records: Vec<ProjectRecord>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                records,
                ..MemoryState::default()
            })),
        }
    }

    /// Load records from a JSON file shaped like the `GET /projects` response
    pub fn from_fixture_file(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let envelope: Envelope<Vec<ProjectRecord>> = serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(envelope.data))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add or replace a record
    pub fn upsert(&self, record: ProjectRecord) {
        let mut state = self.lock();
        match state.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => state.records.push(record),
        }
    }

    /// Make `GET /projects` fail until reset
    pub fn set_fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Make sub-project and single-project requests for `id` fail until reset
    pub fn set_failing(&self, id: impl Into<ProjectId>, fail: bool) {
        let id = id.into();
        let mut state = self.lock();
        if fail {
            state.failing_ids.insert(id);
        } else {
            state.failing_ids.remove(&id);
        }
    }

    /// Every request made so far, in order
    pub fn requests(&self) -> Vec<BackendRequest> {
        self.lock().requests.clone()
    }

    /// Number of sub-project requests made for `id`
    pub fn sub_project_calls(&self, id: &ProjectId) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| matches!(r, BackendRequest::ListSubProjects(x) if x == id))
            .count()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }
}

#[async_trait]
impl ProjectsBackend for InMemoryProjectsBackend {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, FetchError> {
        let mut state = self.lock();
        state.requests.push(BackendRequest::ListProjects);
        if state.fail_list {
            return Err(FetchError::Status(500));
        }
        Ok(state.records.clone())
    }

    async fn list_sub_projects(&self, id: &ProjectId) -> Result<Vec<ProjectRecord>, FetchError> {
        let mut state = self.lock();
        state
            .requests
            .push(BackendRequest::ListSubProjects(id.clone()));
        if state.failing_ids.contains(id) {
            return Err(FetchError::Status(500));
        }

        // The sub-projects endpoint does not echo parent_id
        Ok(state
            .records
            .iter()
            .filter(|r| r.parent_id.as_ref() == Some(id))
            .map(|r| ProjectRecord {
                parent_id: None,
                ..r.clone()
            })
            .collect())
    }

    async fn get_project(&self, id: &ProjectId) -> Result<ProjectRecord, FetchError> {
        let mut state = self.lock();
        state.requests.push(BackendRequest::GetProject(id.clone()));
        if state.failing_ids.contains(id) {
            return Err(FetchError::Status(500));
        }
        state
            .records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.clone()))
    }
}
