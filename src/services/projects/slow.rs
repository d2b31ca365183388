//! Slow projects backend for testing
//!
//! Wraps any ProjectsBackend and adds configurable delays to simulate a slow
//! API server. Used to exercise the selector while fetches are in flight.

use super::backend::{FetchError, ProjectRecord, ProjectsBackend};
use crate::project_tree::ProjectId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Configuration for slow backend simulation
#[derive(Debug, Clone)]
pub struct SlowBackendConfig {
    pub list_projects_delay: Duration,
    pub sub_projects_delay: Duration,
    pub get_project_delay: Duration,
}

impl SlowBackendConfig {
    /// Same delay for every operation
    pub fn uniform(delay: Duration) -> Self {
        Self {
            list_projects_delay: delay,
            sub_projects_delay: delay,
            get_project_delay: delay,
        }
    }

    pub fn none() -> Self {
        Self::uniform(Duration::ZERO)
    }
}

impl Default for SlowBackendConfig {
    fn default() -> Self {
        Self::none()
    }
}

/// Call counters for the wrapped backend
#[derive(Debug, Clone, Default)]
pub struct BackendMetrics {
    pub list_projects_calls: usize,
    pub sub_projects_calls: usize,
    pub get_project_calls: usize,
    /// Total time spent in artificial delays
    pub total_delay_time: Duration,
}

impl BackendMetrics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_calls(&self) -> usize {
        self.list_projects_calls + self.sub_projects_calls + self.get_project_calls
    }
}

pub struct SlowProjectsBackend {
    inner: Arc<dyn ProjectsBackend>,
    config: SlowBackendConfig,
    metrics: Arc<Mutex<BackendMetrics>>,
}

impl SlowProjectsBackend {
    pub fn new(inner: Arc<dyn ProjectsBackend>, config: SlowBackendConfig) -> Self {
        Self {
            inner,
            config,
            metrics: Arc::new(Mutex::new(BackendMetrics::default())),
        }
    }

    pub fn with_uniform_delay(inner: Arc<dyn ProjectsBackend>, delay: Duration) -> Self {
        Self::new(inner, SlowBackendConfig::uniform(delay))
    }

    pub async fn metrics(&self) -> BackendMetrics {
        self.metrics.lock().await.clone()
    }

    pub async fn reset_metrics(&self) {
        self.metrics.lock().await.reset();
    }

    async fn add_delay(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
            self.metrics.lock().await.total_delay_time += delay;
        }
    }
}

#[async_trait]
impl ProjectsBackend for SlowProjectsBackend {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, FetchError> {
        self.add_delay(self.config.list_projects_delay).await;
        self.metrics.lock().await.list_projects_calls += 1;
        self.inner.list_projects().await
    }

    async fn list_sub_projects(&self, id: &ProjectId) -> Result<Vec<ProjectRecord>, FetchError> {
        self.add_delay(self.config.sub_projects_delay).await;
        self.metrics.lock().await.sub_projects_calls += 1;
        self.inner.list_sub_projects(id).await
    }

    async fn get_project(&self, id: &ProjectId) -> Result<ProjectRecord, FetchError> {
        self.add_delay(self.config.get_project_delay).await;
        self.metrics.lock().await.get_project_calls += 1;
        self.inner.get_project(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::projects::InMemoryProjectsBackend;
    use std::time::Instant;

    fn inner() -> Arc<dyn ProjectsBackend> {
        Arc::new(InMemoryProjectsBackend::new(vec![
            ProjectRecord::new(1, "Spring"),
            ProjectRecord::new(2, "Shirt").with_parent(1),
        ]))
    }

    #[tokio::test]
    async fn test_delay_is_applied() {
        let slow = SlowProjectsBackend::with_uniform_delay(inner(), Duration::from_millis(50));

        let start = Instant::now();
        let children = slow.list_sub_projects(&ProjectId::from(1)).await.unwrap();

        assert_eq!(children.len(), 1);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(
            slow.metrics().await.total_delay_time,
            Duration::from_millis(50)
        );
    }

    #[tokio::test]
    async fn test_metrics_count_calls() {
        let slow = SlowProjectsBackend::new(inner(), SlowBackendConfig::none());

        slow.list_projects().await.unwrap();
        slow.list_sub_projects(&ProjectId::from(1)).await.unwrap();
        slow.list_sub_projects(&ProjectId::from(2)).await.unwrap();
        slow.get_project(&ProjectId::from(1)).await.unwrap();

        let metrics = slow.metrics().await;
        assert_eq!(metrics.list_projects_calls, 1);
        assert_eq!(metrics.sub_projects_calls, 2);
        assert_eq!(metrics.get_project_calls, 1);
        assert_eq!(metrics.total_calls(), 4);

        slow.reset_metrics().await;
        assert_eq!(slow.metrics().await.total_calls(), 0);
    }
}
