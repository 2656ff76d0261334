use axum::Router;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::factory::{ClientOptions, Factory};

/// Serve `app` on an ephemeral local port, returning "127.0.0.1:<port>"
pub(crate) async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

/// A local port nothing is listening on
pub(crate) async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Options pointing both the hub and private registries at a local server
pub(crate) fn options_for(addr: &str) -> ClientOptions {
    ClientOptions {
        hub_url: format!("http://{}", addr),
        insecure: true,
        timeout: Some(Duration::from_secs(5)),
    }
}

pub(crate) fn factory_for(addr: &str) -> Factory {
    Factory::new(options_for(addr)).unwrap()
}

/// Serve one JSON page on the first connection, then hang up on every later one
///
/// `page` receives the server address and returns the body and `Link` header.
pub(crate) async fn serve_one_page_then_hang_up<F>(page: F) -> String
where
    F: FnOnce(&str) -> (String, String) + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (body, link) = page(&addr);

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request_head(&mut stream).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nLink: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            link,
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        drop(stream);

        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    addr
}

async fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
}
