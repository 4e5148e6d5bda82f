use thiserror::Error;

/// Errors that can cross the `cast-media-server` boundary. Per-request I/O
/// failures are handled inline (the connection is simply aborted); this enum
/// covers only the failures a caller of [`crate::MediaServer`] needs to see.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to bind {0}: {1}")]
    Bind(std::net::SocketAddr, std::io::Error),

    #[error("could not build base url for registered file")]
    BaseUrl,
}
