/// Maps a (lowercased, no-dot) file extension to the MIME type sent in
/// `Content-Type`. Unknown extensions fall back to `application/octet-stream`.
pub fn for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "wav" => "audio/wav",
        "wma" => "audio/x-ms-wma",
        "ape" => "audio/x-ape",
        "wv" => "audio/x-wavpack",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_map_exactly() {
        assert_eq!(for_extension("mp3"), "audio/mpeg");
        assert_eq!(for_extension("FLAC"), "audio/flac");
        assert_eq!(for_extension("m4a"), "audio/mp4");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(for_extension("xyz"), "application/octet-stream");
        assert_eq!(for_extension(""), "application/octet-stream");
    }
}
