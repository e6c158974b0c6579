//! Minimal HTTP/1.1 responder so adapter paging loops can run against canned
//! responses.

use crate::credentials::PlatformParams;
use parking_lot::Mutex;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    /// Request line, e.g. `GET /people?page=2 HTTP/1.1`.
    pub line: String,
    pub body: String,
}

pub(crate) struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    /// Answers one connection per reply, in order. Requests are recorded
    /// before the reply is written. `{base}` in a reply body is replaced by the
    /// server's own base URL.
    pub(crate) fn start(replies: Vec<(u16, Value)>) -> Self {
        // Loopback traffic must not be routed through an ambient proxy.
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let base = format!("http://{}", listener.local_addr().expect("local addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let reply_base = base.clone();
        thread::spawn(move || {
            for (status, body) in replies {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let body = body.to_string().replace("{base}", &reply_base);
                serve(stream, status, &body, &seen);
            }
        });
        Self { base, requests }
    }

    pub(crate) fn base(&self) -> &str {
        &self.base
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }
}

fn serve(stream: TcpStream, status: u16, body: &str, seen: &Mutex<Vec<Recorded>>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).expect("request line");

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).expect("header");
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().expect("content length");
            }
        }
    }
    let mut request_body = vec![0u8; content_length];
    reader.read_exact(&mut request_body).expect("request body");
    seen.lock().push(Recorded {
        line: line.trim_end().to_string(),
        body: String::from_utf8_lossy(&request_body).into_owned(),
    });

    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        _ => "Error",
    };
    let mut stream = reader.into_inner();
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).expect("write response");
    stream.flush().expect("flush");
}

pub(crate) fn params(pairs: &[(&str, &str)]) -> PlatformParams {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
