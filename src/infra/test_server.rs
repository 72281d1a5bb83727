// Single-threaded HTTP/1.1 stub for the infra client tests.
//
// Serves one canned response per connection, in order, and hands
// back every request it saw once the responses run out. Each
// response closes its connection, so a client opens a fresh one
// per call.

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    thread::{self, JoinHandle},
};

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method:  String,
    /// Path plus query string, as sent on the request line
    pub target:  String,
    pub headers: Vec<(String, String)>,
    pub body:    String,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct TestServer {
    pub url: String,
    handle:  JoinHandle<Vec<SeenRequest>>,
}

impl TestServer {
    /// Bind an ephemeral local port and answer with `responses`
    /// (status, JSON body), one per request.
    pub fn serve(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|(status, body)| {
                    let (stream, _) = listener.accept().unwrap();
                    answer(stream, status, &body)
                })
                .collect()
        });

        Self { url, handle }
    }

    /// Wait for every response to be served and return the requests.
    pub fn requests(self) -> Vec<SeenRequest> {
        self.handle.join().unwrap()
    }
}

fn answer(stream: TcpStream, status: u16, body: &str) -> SeenRequest {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let len: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    let mut raw = vec![0; len];
    reader.read_exact(&mut raw).unwrap();

    let reason = if status < 400 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).unwrap();
    stream.flush().unwrap();

    SeenRequest { method, target, headers, body: String::from_utf8(raw).unwrap() }
}
