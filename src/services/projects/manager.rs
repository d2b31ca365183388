use super::backend::{FetchError, ProjectRecord, ProjectsBackend};
use crate::project_tree::ProjectId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

type SubProjectsResult = Result<Vec<ProjectRecord>, FetchError>;

/// Type alias for pending sub-project requests map
type PendingSubProjectRequests =
    Arc<Mutex<HashMap<ProjectId, Vec<oneshot::Sender<SubProjectsResult>>>>>;

/// Front door to the projects backend
///
/// Sits between the selector and the backend and coalesces concurrent
/// sub-project requests for the same project (e.g. a rapid double toggle)
/// into one backend call. Refreshes bypass the coalescing.
pub struct ProjectsManager {
    backend: Arc<dyn ProjectsBackend>,
    /// Map of project id -> channels waiting for its sub-projects
    pending_sub_projects: PendingSubProjectRequests,
}

impl fmt::Debug for ProjectsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectsManager")
            .field("backend", &"<dyn ProjectsBackend>")
            .field("pending_sub_projects", &"<mutex>")
            .finish()
    }
}

impl ProjectsManager {
    pub fn new(backend: Arc<dyn ProjectsBackend>) -> Self {
        Self {
            backend,
            pending_sub_projects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// All projects, every level
    pub async fn list_projects(&self) -> Result<Vec<ProjectRecord>, FetchError> {
        self.backend.list_projects().await
    }

    /// Direct children of a project, with request deduplication
    ///
    /// If a request for the same project is already in flight, this waits for
    /// its result instead of issuing another backend call.
    pub async fn list_sub_projects(&self, id: &ProjectId) -> SubProjectsResult {
        let (rx, should_execute) = {
            let mut pending = self.pending_sub_projects.lock().await;
            let (tx, rx) = oneshot::channel();

            if let Some(senders) = pending.get_mut(id) {
                senders.push(tx);
                (rx, false)
            } else {
                pending.insert(id.clone(), vec![tx]);
                (rx, true)
            }
        };

        if should_execute {
            let result = self.backend.list_sub_projects(id).await;

            let mut pending = self.pending_sub_projects.lock().await;
            if let Some(senders) = pending.remove(id) {
                for sender in senders {
                    let _ = sender.send(result.clone());
                }
            }
        }

        rx.await.unwrap_or(Err(FetchError::Cancelled))
    }

    /// Direct children of a project, always fetched by a new backend call.
    ///
    /// Never joins an in-flight request, so the answer is at least as recent
    /// as this call.
    pub async fn refresh_sub_projects(&self, id: &ProjectId) -> SubProjectsResult {
        self.backend.list_sub_projects(id).await
    }

    pub async fn get_project(&self, id: &ProjectId) -> Result<ProjectRecord, FetchError> {
        self.backend.get_project(id).await
    }

    pub fn backend(&self) -> &Arc<dyn ProjectsBackend> {
        &self.backend
    }
}

impl Clone for ProjectsManager {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            pending_sub_projects: Arc::clone(&self.pending_sub_projects),
        }
    }
}
