use thiserror::Error;

/// Errors that can cross the `cast-client` boundary. Internal plumbing
/// failures (a closed mpsc channel, a poisoned lock) are swallowed at the
/// point they occur and logged instead of bubbling up here, matching the
/// "never panic across a component boundary" rule the whole workspace
/// follows.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("tls handshake failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("connect to {0} timed out")]
    ConnectTimeout(std::net::SocketAddr),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("message on unknown channel {0}")]
    UnknownChannel(String),

    #[error("failed to parse payload on {0} channel")]
    Parse(&'static str),
}
