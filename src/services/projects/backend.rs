use crate::project_tree::ProjectId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A project as returned by the listing endpoints.
///
/// `GET /projects` fills `parent_id`; `GET /projects/{id}/sub-projects`
/// omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ProjectId>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ProjectRecord {
    pub fn new(id: impl Into<ProjectId>, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            parent_id: None,
            created_at: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ProjectId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_created_at(mut self, created_at: &str) -> Self {
        self.created_at = Some(created_at.to_string());
        self
    }

    /// Root-level projects have no parent. An absent `parent_id` counts as null.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// `{ "data": ... }` wrapper used by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Failure of any projects fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure
    Transport(String),
    /// Server answered with a non-success status
    Status(u16),
    /// Body was not the expected JSON shape
    Decode(String),
    /// The task running the request went away
    Cancelled,
    /// No such project (in-memory backend)
    NotFound(ProjectId),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {}", msg),
            FetchError::Status(code) => write!(f, "server returned status {}", code),
            FetchError::Decode(msg) => write!(f, "invalid response body: {}", msg),
            FetchError::Cancelled => write!(f, "request cancelled"),
            FetchError::NotFound(id) => write!(f, "project {} not found", id),
        }
    }
}

impl std::error::Error for FetchError {}

/// Async project-listing backend
///
/// Abstracts the backend's project API so the selector can run against HTTP,
/// an in-memory fixture, or a test double with artificial latency.
#[async_trait]
pub trait ProjectsBackend: Send + Sync {
    /// `GET /projects`: every project visible to the user, all levels
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, FetchError>;

    /// `GET /projects/{id}/sub-projects`: direct children of one project
    async fn list_sub_projects(&self, id: &ProjectId) -> Result<Vec<ProjectRecord>, FetchError>;

    /// `GET /projects/{id}`: a single project
    async fn get_project(&self, id: &ProjectId) -> Result<ProjectRecord, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_root_listing() {
        let body = r#"{"data":[
            {"id":1,"name":"Spring","parent_id":null,"created_at":"2024-03-01T10:00:00Z"},
            {"id":5,"name":"Lining","parent_id":1,"created_at":"2024-03-02T10:00:00Z"}
        ]}"#;

        let envelope: Envelope<Vec<ProjectRecord>> = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.data.len(), 2);
        assert!(envelope.data[0].is_root());
        assert!(!envelope.data[1].is_root());
        assert_eq!(envelope.data[1].parent_id, Some(ProjectId::from(1)));
    }

    #[test]
    fn test_decode_sub_projects_without_parent_field() {
        let body = r#"{"data":[{"id":3,"name":"Jacket","created_at":"2024-05-01"}]}"#;

        let envelope: Envelope<Vec<ProjectRecord>> = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.data[0].id, ProjectId::from(3));
        assert_eq!(envelope.data[0].created_at.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            FetchError::Status(503).to_string(),
            "server returned status 503"
        );
        assert_eq!(
            FetchError::NotFound(ProjectId::from(4)).to_string(),
            "project 4 not found"
        );
    }
}
