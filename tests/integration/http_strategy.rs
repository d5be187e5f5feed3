//! HTTP strategy against a local stub server

use fetch_bench::bench::TimeoutExecutor;
use fetch_bench::fetcher::{FetchStrategy, FetcherError, HttpStrategy};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve canned responses by path until the test ends.
///
/// `/ok` returns a body, `/empty` a 200 with no body, `/slow` answers after
/// three seconds, anything else is a 404.
async fn spawn_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (status, body) = match path.as_str() {
                    "/ok" => ("200 OK", "<html>hello</html>"),
                    "/empty" => ("200 OK", ""),
                    "/slow" => {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        ("200 OK", "late")
                    }
                    _ => ("404 Not Found", "missing"),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

/// Strategy with its own client so pooled connections never outlive a test runtime.
fn strategy() -> HttpStrategy {
    HttpStrategy::with_client(Arc::new(reqwest::Client::new()))
}

#[tokio::test]
async fn test_ok_response_succeeds() {
    let base = spawn_stub().await;
    strategy()
        .attempt(&format!("{base}/ok"), Duration::from_secs(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_body_fails() {
    let base = spawn_stub().await;
    let result = strategy()
        .attempt(&format!("{base}/empty"), Duration::from_secs(5))
        .await;
    assert!(matches!(result, Err(FetcherError::EmptyBody)));
}

#[tokio::test]
async fn test_non_200_fails() {
    let base = spawn_stub().await;
    let result = strategy()
        .attempt(&format!("{base}/nope"), Duration::from_secs(5))
        .await;
    assert!(matches!(result, Err(FetcherError::UnexpectedStatus(404))));
}

#[tokio::test]
async fn test_unreachable_host_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = strategy()
        .attempt(&format!("http://{addr}/ok"), Duration::from_secs(5))
        .await;
    assert!(matches!(result, Err(FetcherError::HttpError(_))));
}

#[tokio::test]
async fn test_slow_response_classified_as_failure() {
    let base = spawn_stub().await;
    let http: Arc<dyn FetchStrategy> = Arc::new(strategy());
    let timeout = Duration::from_secs(1);

    let outcome = TimeoutExecutor::new()
        .execute(&format!("{base}/slow"), &http, timeout)
        .await;

    assert!(!outcome.succeeded);
    assert!(outcome.elapsed <= timeout);
}
