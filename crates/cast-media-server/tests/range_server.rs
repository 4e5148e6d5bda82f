use std::io::Write;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn get(addr: std::net::SocketAddr, path: &str, range: Option<&str>) -> (String, Vec<u8>) {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let mut request = format!("GET {path} HTTP/1.1\r\n");
    if let Some(range) = range {
        request.push_str(&format!("Range: {range}\r\n"));
    }
    request.push_str("\r\n");
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    socket.read_to_end(&mut raw).await.unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header/body separator");
    let headers = String::from_utf8(raw[..split].to_vec()).unwrap();
    let body = raw[split + 4..].to_vec();
    (headers, body)
}

fn temp_file(bytes: &[u8], extension: &str) -> tempfile::TempPath {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .unwrap();
    file.write_all(bytes).unwrap();
    file.into_temp_path()
}

#[tokio::test]
async fn serves_whole_file_with_200() {
    let body = vec![7u8; 5000];
    let path = temp_file(&body, "flac");
    let server = cast_media_server::MediaServer::start(0, None).await.unwrap();
    let url = server.register(&path).await;
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", url.port().unwrap())
        .parse()
        .unwrap();

    let (headers, returned) = get(addr, url.path(), None).await;
    assert!(headers.starts_with("HTTP/1.1 200 OK"));
    assert!(headers.contains("Content-Length: 5000"));
    assert!(headers.contains("Content-Type: audio/flac"));
    assert_eq!(returned, body);
}

#[tokio::test]
async fn serves_byte_range_with_206() {
    let body: Vec<u8> = (0..=255u32).cycle().take(5_242_880).map(|b| b as u8).collect();
    let path = temp_file(&body, "flac");
    let server = cast_media_server::MediaServer::start(0, None).await.unwrap();
    let url = server.register(&path).await;
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", url.port().unwrap())
        .parse()
        .unwrap();

    let (headers, returned) = get(addr, url.path(), Some("bytes=1000000-1999999")).await;
    assert!(headers.starts_with("HTTP/1.1 206 Partial Content"));
    assert!(headers.contains("Content-Range: bytes 1000000-1999999/5242880"));
    assert!(headers.contains("Content-Length: 1000000"));
    assert_eq!(returned, body[1_000_000..=1_999_999]);
}

#[tokio::test]
async fn open_ended_range_covers_to_end_of_file() {
    let body = vec![9u8; 2000];
    let path = temp_file(&body, "mp3");
    let server = cast_media_server::MediaServer::start(0, None).await.unwrap();
    let url = server.register(&path).await;
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", url.port().unwrap())
        .parse()
        .unwrap();

    let (headers, returned) = get(addr, url.path(), Some("bytes=1500-")).await;
    assert!(headers.contains("Content-Range: bytes 1500-1999/2000"));
    assert_eq!(returned, body[1500..]);
}

#[tokio::test]
async fn unknown_path_returns_404_with_exact_body() {
    let server = cast_media_server::MediaServer::start(0, None).await.unwrap();
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", server_port(&server))
        .parse()
        .unwrap();

    let (headers, body) = get(addr, "/media/nope.mp3", None).await;
    assert!(headers.starts_with("HTTP/1.1 404 Not Found"));
    assert!(headers.contains("Content-Length: 13"));
    assert_eq!(body, b"404 Not Found");
}

fn server_port(server: &cast_media_server::MediaServer) -> u16 {
    server.base_url().port().unwrap()
}
