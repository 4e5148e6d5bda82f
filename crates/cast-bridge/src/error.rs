use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cast session error: {0}")]
    Session(#[from] cast_client::Error),

    #[error("transcoding {src} failed: {reason}")]
    Transcode { src: std::path::PathBuf, reason: String },

    #[error("media server error: {0}")]
    MediaServer(#[from] cast_media_server::Error),
}
