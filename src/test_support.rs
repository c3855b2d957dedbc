//! Test helpers: a tiny HTTP server that replays a scripted sequence of responses.

use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;

#[derive(Default)]
struct Script {
    responses: Mutex<VecDeque<(u16, String)>>,
    hits: AtomicUsize,
}

/// Serves the scripted responses in order; the last one repeats once the script runs out.
pub(crate) struct ScriptedServer {
    base_url: String,
    script: Arc<Script>,
}

impl ScriptedServer {
    pub(crate) async fn start(responses: Vec<(u16, &str)>) -> Self {
        let script = Arc::new(Script {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| (status, body.to_string()))
                    .collect(),
            ),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .fallback(scripted_response)
            .with_state(script.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            script,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn hits(&self) -> usize {
        self.script.hits.load(Ordering::SeqCst)
    }
}

async fn scripted_response(State(script): State<Arc<Script>>) -> Response {
    script.hits.fetch_add(1, Ordering::SeqCst);
    let (status, body) = {
        let mut responses = script.responses.lock().expect("script lock");
        if responses.len() > 1 {
            responses.pop_front().expect("non-empty script")
        } else {
            responses
                .front()
                .cloned()
                .unwrap_or((404, String::new()))
        }
    };
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
