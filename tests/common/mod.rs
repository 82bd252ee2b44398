//! Common test utilities: a local Conference Hall stand-in

#![allow(dead_code)]

use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;

/// Bytes served for every `.jpg` photo route
pub const JPEG_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

/// HTTP server on a loopback port, running on its own thread for the rest of the test
pub struct FixtureServer {
    addr: SocketAddr,
}

impl FixtureServer {
    /// Serve `export(base_url)` at `/export`, a JPEG at `/photos/jane.jpg`,
    /// a non-JSON body at `/broken`, and a JSON body with status 404 at `/gone`.
    /// Every other path is a plain 404.
    pub fn start(export: impl FnOnce(&str) -> Value) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("local addr");

        let body = export(&format!("http://{addr}"));
        let app = Router::new()
            .route(
                "/export",
                get(move || {
                    let body = body.clone();
                    async move { Json(body) }
                }),
            )
            .route(
                "/photos/jane.jpg",
                get(|| async { ([(header::CONTENT_TYPE, "image/jpeg")], JPEG_BYTES.to_vec()) }),
            )
            .route("/broken", get(|| async { "<html>maintenance</html>" }))
            .route(
                "/gone",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "talks": [], "speakers": [] })),
                    )
                }),
            );

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app).await.expect("fixture server");
            });
        });

        Self { addr }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn talk(id: &str, title: &str, state: &str, speakers: &[&str]) -> Value {
    json!({
        "id": id,
        "title": title,
        "state": state,
        "abstract": format!("About {title}"),
        "speakers": speakers,
        "createTimestamp": { "_seconds": 1_698_300_000, "_nanoseconds": 0 }
    })
}
