//! Local HTTP server standing in for the projects API

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A request as seen by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
}

/// Serves canned JSON per path; anything else is a 404.
/// The server stops when this value is dropped.
pub struct MockProjectsApi {
    base_url: String,
    routes: Arc<Mutex<HashMap<String, (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    stop_tx: mpsc::Sender<()>,
}

impl MockProjectsApi {
    pub fn start() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("Failed to start test server");
        let port = server.server_addr().to_ip().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}/api", port);

        let routes: Arc<Mutex<HashMap<String, (u16, String)>>> = Arc::default();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let server_routes = Arc::clone(&routes);
        let server_requests = Arc::clone(&requests);
        thread::spawn(move || loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }

            match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(request)) => {
                    let path = request
                        .url()
                        .strip_prefix("/api")
                        .unwrap_or(request.url())
                        .to_string();
                    let authorization = request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("Authorization"))
                        .map(|h| h.value.as_str().to_string());
                    server_requests.lock().unwrap().push(RecordedRequest {
                        path: path.clone(),
                        authorization,
                    });

                    let (status, body) = server_routes
                        .lock()
                        .unwrap()
                        .get(&path)
                        .cloned()
                        .unwrap_or((404, r#"{"detail": "Not found"}"#.to_string()));
                    let response = tiny_http::Response::from_string(body)
                        .with_status_code(status)
                        .with_header(
                            tiny_http::Header::from_bytes(
                                &b"Content-Type"[..],
                                &b"application/json"[..],
                            )
                            .unwrap(),
                        );
                    let _ = request.respond(response);
                }
                Ok(None) => {}
                Err(_) => break,
            }
        });

        Self {
            base_url,
            routes,
            requests,
            stop_tx,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Answer `GET {base}{path}` with `status` and `body`
    pub fn route(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

impl Drop for MockProjectsApi {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
