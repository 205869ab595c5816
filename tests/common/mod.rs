#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One request as the fake Graylog saw it
#[derive(Debug)]
pub struct Captured {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Serves one canned `(status, body)` per connection, then stops.
pub struct FakeGraylog {
    pub base_url: String,
    requests: Receiver<Captured>,
    handle: JoinHandle<()>,
}

impl FakeGraylog {
    pub fn start(responses: Vec<(u16, &'static str)>) -> Self {
        Self::start_slow(responses, Duration::ZERO)
    }

    /// Like [FakeGraylog::start], but sits on every request for `delay`
    /// before answering
    pub fn start_slow(responses: Vec<(u16, &'static str)>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake graylog");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, requests) = mpsc::channel();

        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();

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

                let length = headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .map(|(_, v)| v.parse::<usize>().unwrap())
                    .unwrap_or(0);
                let mut buf = vec![0; length];
                reader.read_exact(&mut buf).unwrap();

                tx.send(Captured {
                    request_line: request_line.trim_end().to_string(),
                    headers,
                    body: String::from_utf8(buf).unwrap(),
                })
                .unwrap();

                thread::sleep(delay);
                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                )
                .unwrap();
                stream.flush().unwrap();
            }
        });

        Self {
            base_url,
            requests,
            handle,
        }
    }

    /// Wait for the server to answer everything and return what it saw
    pub fn finish(self) -> Vec<Captured> {
        self.handle.join().expect("fake graylog thread");
        self.requests.try_iter().collect()
    }
}

pub const MACHINE_CSV: &str = "\
name,description,owner,priority,hostnames,macs,ips,category,city,region,country,lat,lon,iso,tz
web-01,Frontend,ops,3,web-01,00:11:22:33:44:55,10.0.0.5,prod,Houston,Texas,United States,29.76,-95.36,US,America/Chicago
db-01,Database,dba,4,\"db-01, db-01.lan\",00:11:22:33:44:66,\"10.0.0.6, 10.0.0.7\",\"prod, pci\",Austin,Texas,United States,30.27,-97.74,US,America/Chicago
";
