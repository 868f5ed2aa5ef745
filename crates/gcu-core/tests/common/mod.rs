//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tiny_http::{Header, Response, Server};

#[derive(Default)]
struct Resource {
    body: String,
    last_modified: Option<String>,
    status: u16,
    hits: usize,
}

/// Serves one mutable resource until dropped.
pub struct TestServer {
    pub url: String,
    server: Arc<Server>,
    resource: Arc<Mutex<Resource>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start(body: &str, last_modified: Option<&str>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind test server"));
        let addr = server.server_addr().to_ip().expect("ip listener");
        let resource = Arc::new(Mutex::new(Resource {
            body: body.to_string(),
            last_modified: last_modified.map(str::to_string),
            status: 200,
            hits: 0,
        }));

        let handle = {
            let server = Arc::clone(&server);
            let resource = Arc::clone(&resource);
            std::thread::spawn(move || {
                for request in server.incoming_requests() {
                    let response = {
                        let mut res = resource.lock().unwrap();
                        res.hits += 1;
                        let mut response =
                            Response::from_string(res.body.clone()).with_status_code(res.status);
                        if let Some(value) = &res.last_modified {
                            response = response.with_header(
                                Header::from_bytes(&b"Last-Modified"[..], value.as_bytes())
                                    .unwrap(),
                            );
                        }
                        response
                    };
                    // Header-only fetches hang up before the body is sent.
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            server,
            resource,
            handle: Some(handle),
            url: format!("http://{}/config", addr),
        }
    }

    pub fn set_body(&self, body: &str) {
        self.resource.lock().unwrap().body = body.to_string();
    }

    pub fn set_last_modified(&self, value: &str) {
        self.resource.lock().unwrap().last_modified = Some(value.to_string());
    }

    pub fn set_status(&self, status: u16) {
        self.resource.lock().unwrap().status = status;
    }

    pub fn hits(&self) -> usize {
        self.resource.lock().unwrap().hits
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
