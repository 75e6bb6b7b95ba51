use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::HashMap;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type Files = Arc<Mutex<HashMap<String, Vec<u8>>>>;

/// Serves in-memory files by exact path and records every requested path.
pub struct TestServer {
    addr: SocketAddr,
    files: Files,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<std::io::Result<()>>,
}

#[derive(Clone)]
struct AppState {
    files: Files,
    requests: Arc<Mutex<Vec<String>>>,
}

async fn serve_file(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(path.clone());

    match state.files.lock().unwrap().get(&path) {
        Some(body) => (StatusCode::OK, body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl TestServer {
    pub async fn launch() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?; // 0: port picked by the OS
        let addr = listener.local_addr()?;

        let state = AppState {
            files: Arc::default(),
            requests: Arc::default(),
        };
        let app = Router::new()
            .fallback(serve_file)
            .with_state(state.clone());

        let handle = tokio::spawn(axum::serve(listener, app).into_future());

        Ok(Self {
            addr,
            files: state.files,
            requests: state.requests,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn add_file(&self, path: &str, body: Vec<u8>) {
        self.files.lock().unwrap().insert(path.to_string(), body);
    }

    pub fn add_json(&self, path: &str, value: serde_json::Value) {
        self.add_file(path, value.to_string().into_bytes());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self, prefix: &str) -> bool {
        self.requests().iter().any(|path| path.starts_with(prefix))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
