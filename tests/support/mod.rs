#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

pub struct ReceivedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A one-shot local HTTP stub: serves one canned response per expected
/// request, one connection each, and hands back what it received.
pub struct StubServer {
    pub url: String,
    handle: JoinHandle<Vec<ReceivedRequest>>,
}

impl StubServer {
    pub fn start(responses: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let url = format!("http://{}/", listener.local_addr().expect("stub addr"));

        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|response| serve_one(&listener, &response))
                .collect()
        });

        Self { url, handle }
    }

    pub fn serve_once(response: String) -> Self {
        Self::start(vec![response])
    }

    pub fn finish(self) -> Vec<ReceivedRequest> {
        self.handle.join().expect("stub server thread")
    }

    pub fn finish_one(self) -> ReceivedRequest {
        self.finish().remove(0)
    }
}

fn serve_one(listener: &TcpListener, response: &str) -> ReceivedRequest {
    let (stream, _) = listener.accept().expect("accept connection");
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .expect("read request line");

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).expect("read request body");

    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).expect("write response");
    stream.flush().expect("flush response");

    ReceivedRequest {
        request_line: request_line.trim_end().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

pub fn http_response(status: &str, body: &str) -> String {
    http_response_with(status, &[], body)
}

pub fn http_response_with(status: &str, extra_headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (name, value) in extra_headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(body);
    response
}

/// An address nothing listens on. Connecting fails fast, so pointing a
/// component here proves the happy path never issues that call.
pub fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let url = format!("http://{}/", listener.local_addr().expect("probe addr"));
    drop(listener);
    url
}

pub fn test_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .no_proxy()
        .build()
        .expect("build test client")
}
