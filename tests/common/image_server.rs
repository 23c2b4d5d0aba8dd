//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths with GET; every other path is a 404 and
//! `/error` is always a 500. Each connection carries one request.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct Resource {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Starts a server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start(resources: Vec<(&str, Resource)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let resources: Arc<HashMap<String, Resource>> = Arc::new(
        resources
            .into_iter()
            .map(|(path, r)| (path.to_string(), r))
            .collect(),
    );
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let resources = Arc::clone(&resources);
            thread::spawn(move || handle(stream, &resources));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

pub fn html(body: &str) -> Resource {
    Resource {
        content_type: "text/html; charset=utf-8",
        body: body.as_bytes().to_vec(),
    }
}

pub fn image(content_type: &'static str, body: &[u8]) -> Resource {
    Resource {
        content_type,
        body: body.to_vec(),
    }
}

fn handle(mut stream: std::net::TcpStream, resources: &HashMap<String, Resource>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");

    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"");
        return;
    }

    match resources.get(path) {
        Some(resource) => respond(&mut stream, "200 OK", resource.content_type, &resource.body),
        None if path == "/error" => {
            respond(&mut stream, "500 Internal Server Error", "text/plain", b"boom")
        }
        None => respond(&mut stream, "404 Not Found", "text/plain", b"not found"),
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}
