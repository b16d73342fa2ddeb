use std::net::SocketAddr;
use std::time::Duration;

use http::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use usecase::{Api, Config, Request};

async fn ok(_req: Request) -> &'static str {
    "meow"
}

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn connect(addr: SocketAddr) -> TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("api listener never came up on {addr}");
}

#[tokio::test]
async fn api_serves_when_docs_port_is_taken() {
    // Held for the whole test so the docs listener cannot bind.
    let squatter = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let docs_port = squatter.local_addr().unwrap().port();
    let api_port = free_port().await;

    let (tx, rx) = oneshot::channel::<()>();
    let api = Api::from_config(Config {
        host: [127, 0, 0, 1].into(),
        api_port,
        docs_port,
        ..Config::default()
    })
    .route("/cat", Method::GET, ok);
    let running = tokio::spawn(api.listen_with_shutdown(async {
        let _ = rx.await;
    }));

    let mut stream = connect(SocketAddr::from(([127, 0, 0, 1], api_port))).await;
    stream
        .write_all(b"GET /cat HTTP/1.1\r\nHost: cat\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut res = Vec::new();
    stream.read_to_end(&mut res).await.unwrap();
    let res = String::from_utf8_lossy(&res);
    assert!(res.starts_with("HTTP/1.1 200"), "{res}");
    assert!(res.ends_with("meow"), "{res}");

    tx.send(()).unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(3), running).await;
    assert!(matches!(stopped, Ok(Ok(Ok(())))));
    drop(squatter);
}
