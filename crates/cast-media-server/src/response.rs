use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::request::Range;

/// Streamed in 64 KiB chunks, matching the Cast wire protocol's own framing
/// unit and the chunk size the original implementation used.
const CHUNK_SIZE: usize = 64 * 1024;

const NOT_FOUND_BODY: &str = "404 Not Found";

pub async fn not_found(socket: &mut (impl AsyncWrite + Unpin)) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 404 Not Found\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        NOT_FOUND_BODY.len(),
        NOT_FOUND_BODY
    );
    socket.write_all(response.as_bytes()).await?;
    socket.flush().await
}

/// Serves `file` (already opened, `size` bytes long) honoring an optional
/// byte range. Writes headers then streams the body; the caller closes the
/// connection afterward (`Connection: close` is always sent).
pub async fn serve_file(
    socket: &mut (impl AsyncWrite + Unpin),
    file: &mut File,
    size: u64,
    mime: &str,
    range: Option<Range>,
) -> std::io::Result<()> {
    match range {
        Some(range) => serve_range(socket, file, size, mime, range).await,
        None => serve_whole(socket, file, size, mime).await,
    }
}

async fn serve_whole(
    socket: &mut (impl AsyncWrite + Unpin),
    file: &mut File,
    size: u64,
    mime: &str,
) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {mime}\r\n\
         Content-Length: {size}\r\n\
         Accept-Ranges: bytes\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\
         \r\n"
    );
    socket.write_all(response.as_bytes()).await?;
    stream_chunks(socket, file, size).await?;
    socket.flush().await
}

async fn serve_range(
    socket: &mut (impl AsyncWrite + Unpin),
    file: &mut File,
    size: u64,
    mime: &str,
    range: Range,
) -> std::io::Result<()> {
    let start = range.start.unwrap_or(0);
    let end = range.end.filter(|&end| end < size).unwrap_or(size - 1);
    let content_length = end.saturating_sub(start) + 1;

    let response = format!(
        "HTTP/1.1 206 Partial Content\r\n\
         Content-Type: {mime}\r\n\
         Content-Length: {content_length}\r\n\
         Content-Range: bytes {start}-{end}/{size}\r\n\
         Accept-Ranges: bytes\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\
         \r\n"
    );
    socket.write_all(response.as_bytes()).await?;

    use tokio::io::AsyncSeekExt;
    file.seek(std::io::SeekFrom::Start(start)).await?;
    stream_chunks(socket, file, content_length).await?;
    socket.flush().await
}

async fn stream_chunks(
    socket: &mut (impl AsyncWrite + Unpin),
    file: &mut (impl AsyncRead + Unpin),
    mut remaining: u64,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    while remaining > 0 {
        let want = CHUNK_SIZE.min(remaining as usize);
        let read = file.read(&mut buf[..want]).await?;
        if read == 0 {
            break;
        }
        socket.write_all(&buf[..read]).await?;
        remaining -= read as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn not_found_has_exact_body_and_length() {
        let mut out = Vec::new();
        not_found(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 13\r\n"));
        assert!(text.ends_with("404 Not Found"));
    }
}
