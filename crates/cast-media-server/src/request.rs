use tokio::io::{AsyncBufReadExt, AsyncRead};

/// A byte range requested via the `Range` header. Either bound may be
/// unspecified: `bytes=1000-` means "from 1000 to end of file", `bytes=-500`
/// is not supported by this server (only a start-anchored form is), matching
/// the parser the receiver's own requests exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub range: Option<Range>,
}

/// Reads and parses an HTTP/1.1 request line plus headers from `reader`,
/// stopping at the blank line that terminates the header block. The request
/// body, if any, is never read — this server only ever serves `GET`.
pub async fn parse(reader: &mut (impl AsyncRead + Unpin)) -> std::io::Result<Option<Request>> {
    let mut lines = tokio::io::BufReader::new(reader);
    let mut line = String::new();
    if lines.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let mut parts = line.trim_end().splitn(3, ' ');
    let method = parts.next().unwrap_or("").to_owned();
    let path = parts.next().unwrap_or("").to_owned();
    if method.is_empty() || path.is_empty() {
        return Ok(Some(Request {
            method,
            path,
            range: None,
        }));
    }

    let mut range = None;
    loop {
        let mut header = String::new();
        if lines.read_line(&mut header).await? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some(value) = strip_header(header, "range") {
            range = parse_range(value);
        }
    }

    Ok(Some(Request {
        method,
        path,
        range,
    }))
}

fn strip_header<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
}

/// Parses `bytes=START-END`, with either side optional.
fn parse_range(value: &str) -> Option<Range> {
    let spec = value.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let start = if start.is_empty() {
        None
    } else {
        Some(start.parse().ok()?)
    };
    let end = if end.is_empty() {
        None
    } else {
        Some(end.parse().ok()?)
    };
    Some(Range { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse_str(s: &str) -> Option<Request> {
        let mut cursor = std::io::Cursor::new(s.as_bytes().to_vec());
        parse(&mut cursor).await.unwrap()
    }

    #[tokio::test]
    async fn parses_method_and_path() {
        let req = parse_str("GET /media/abc.mp3 HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/media/abc.mp3");
        assert!(req.range.is_none());
    }

    #[tokio::test]
    async fn parses_full_range() {
        let req = parse_str("GET /x HTTP/1.1\r\nRange: bytes=1000-1999\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(
            req.range,
            Some(Range {
                start: Some(1000),
                end: Some(1999)
            })
        );
    }

    #[tokio::test]
    async fn parses_open_ended_range() {
        let req = parse_str("GET /x HTTP/1.1\r\nRange: bytes=500-\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(
            req.range,
            Some(Range {
                start: Some(500),
                end: None
            })
        );
    }

    #[tokio::test]
    async fn header_lookup_is_case_insensitive() {
        let req = parse_str("GET /x HTTP/1.1\r\nRANGE: bytes=0-99\r\n\r\n")
            .await
            .unwrap();
        assert!(req.range.is_some());
    }

    #[tokio::test]
    async fn empty_stream_yields_none() {
        assert!(parse_str("").await.is_none());
    }
}
