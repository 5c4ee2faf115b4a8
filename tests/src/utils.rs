#![cfg(test)]
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use egress_common::config::GuardConfig;
use egress_common::network::range::DenyList;
use egress_core::resolver::Resolver;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const METADATA: IpAddr = IpAddr::V4(Ipv4Addr::new(169, 254, 169, 254));

/// Answers with the next entry on every call and repeats the last one when it runs out.
pub struct SequenceResolver {
    answers: Vec<Vec<IpAddr>>,
    calls: AtomicUsize,
}

impl SequenceResolver {
    pub fn new(answers: Vec<Vec<IpAddr>>) -> Self {
        Self {
            answers,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for SequenceResolver {
    async fn resolve(&self, host: &str) -> anyhow::Result<Vec<IpAddr>> {
        let idx: usize = self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(idx)
            .or(self.answers.last())
            .cloned()
            .with_context(|| format!("no answer for {host}"))
    }
}

/// The default policy with loopback opened up, so the local test server is reachable.
pub fn loopback_allowed() -> GuardConfig {
    GuardConfig {
        deny_list: DenyList::default().without("127.0.0.0/8".parse().unwrap()),
        ..GuardConfig::default()
    }
}

pub type Handler = fn(path: &str, port: u16) -> String;

/// A throwaway HTTP/1.1 server on 127.0.0.1. Each connection serves one request.
pub struct TestServer {
    pub port: u16,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start(handler: Handler) -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port: u16 = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let path: String = read_request_path(&mut stream).await.unwrap_or_default();
                    let response: String = handler(&path, port);
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { port, hits }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn url(&self, host: &str, path: &str) -> String {
        format!("http://{host}:{}{path}", self.port)
    }
}

async fn read_request_path(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut request: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n: usize = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let text = String::from_utf8_lossy(&request);
    Ok(text.split_whitespace().nth(1).unwrap_or("/").to_string())
}

pub fn html(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

pub fn redirect(location: &str) -> String {
    format!(
        "HTTP/1.1 302 Found\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    )
}

pub fn not_found() -> String {
    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
}
