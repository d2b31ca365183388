use super::backend::{Envelope, FetchError, ProjectRecord, ProjectsBackend};
use crate::config::ApiConfig;
use crate::project_tree::ProjectId;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Projects backend talking to the REST API over HTTP.
///
/// `ureq` is blocking, so every request runs on tokio's blocking pool.
#[derive(Clone)]
pub struct HttpProjectsBackend {
    agent: ureq::Agent,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for HttpProjectsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProjectsBackend")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpProjectsBackend {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, url::ParseError> {
        Self::new(
            &config.base_url,
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL extended with `segments`, each percent-encoded as one path segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, FetchError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        let token = self.token.clone();

        tokio::task::spawn_blocking(move || {
            tracing::debug!("GET {}", url);
            let mut request = agent.request_url("GET", &url).set("Accept", "application/json");
            if let Some(token) = &token {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }

            let response = request.call().map_err(|e| match e {
                ureq::Error::Status(code, _) => FetchError::Status(code),
                ureq::Error::Transport(t) => FetchError::Transport(t.to_string()),
            })?;

            let body = response
                .into_string()
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            serde_json::from_str::<Envelope<T>>(&body)
                .map(|envelope| envelope.data)
                .map_err(|e| FetchError::Decode(e.to_string()))
        })
        .await
        .map_err(|_| FetchError::Cancelled)?
    }
}

#[async_trait]
impl ProjectsBackend for HttpProjectsBackend {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, FetchError> {
        self.get_json(self.url(&["projects"])).await
    }

    async fn list_sub_projects(&self, id: &ProjectId) -> Result<Vec<ProjectRecord>, FetchError> {
        self.get_json(self.url(&["projects", id.as_str(), "sub-projects"])).await
    }

    async fn get_project(&self, id: &ProjectId) -> Result<ProjectRecord, FetchError> {
        self.get_json(self.url(&["projects", id.as_str()])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let backend =
            HttpProjectsBackend::new("http://localhost:8000/api/", None, Duration::from_secs(5))
                .unwrap();

        assert_eq!(backend.base_url(), "http://localhost:8000/api");
        assert_eq!(
            backend.url(&["projects"]).as_str(),
            "http://localhost:8000/api/projects"
        );
    }

    #[test]
    fn test_host_only_base_url() {
        let backend =
            HttpProjectsBackend::new("http://localhost:8000", None, Duration::from_secs(5))
                .unwrap();

        assert_eq!(
            backend.url(&["projects"]).as_str(),
            "http://localhost:8000/projects"
        );
    }

    #[test]
    fn test_ids_are_encoded_as_single_segments() {
        let backend =
            HttpProjectsBackend::new("http://localhost:8000/api", None, Duration::from_secs(5))
                .unwrap();

        let url = backend.url(&["projects", "fw/24", "sub-projects"]);
        assert_eq!(url.path(), "/api/projects/fw%2F24/sub-projects");

        let url = backend.url(&["projects", "a?b#c"]);
        assert_eq!(url.path(), "/api/projects/a%3Fb%23c");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(HttpProjectsBackend::new("not a url", None, Duration::from_secs(5)).is_err());
        let opaque = HttpProjectsBackend::new("mailto:ops@example.com", None, Duration::from_secs(5));
        assert!(opaque.is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let backend = HttpProjectsBackend::new(
            "http://localhost",
            Some("secret-token".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let debug = format!("{:?}", backend);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) is essentially never listening on loopback
        let backend =
            HttpProjectsBackend::new("http://127.0.0.1:9", None, Duration::from_millis(500))
                .unwrap();

        let result = backend.list_projects().await;

        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
