use std::path::{Path, PathBuf};

use crate::Error;

/// Chromecast's Default Media Receiver decodes these natively; anything else
/// is routed through [`Transcoder::transcode`] first.
const NATIVE_EXTENSIONS: &[&str] = &["mp3", "aac", "m4a", "opus", "flac", "ogg", "wav"];

pub fn is_native_format(extension: &str) -> bool {
    NATIVE_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
}

/// Invokes `ffmpeg` to produce an MP3 in a scratch directory private to this
/// process, removed on drop. Grounded in the original's `TranscodingManager`,
/// which always targets `libmp3lame` for the bridge's one invoked path, but
/// keeps bitrate a constructor-level knob rather than a hidden constant.
pub struct Transcoder {
    scratch_dir: PathBuf,
    bitrate_kbps: u32,
}

impl Transcoder {
    /// `bitrate_kbps` defaults to 192 (the "Balanced" tier in the original),
    /// matching spec's default when unset.
    pub fn new(bitrate_kbps: u32) -> std::io::Result<Self> {
        let scratch_dir = std::env::temp_dir().join(format!("cast-bridge-{}", std::process::id()));
        std::fs::create_dir_all(&scratch_dir)?;
        Ok(Self {
            scratch_dir,
            bitrate_kbps,
        })
    }

    /// Runs `ffmpeg -y -i <src> -codec:a libmp3lame -b:a <bitrate>k <dst>`
    /// and awaits completion without blocking the caller's event loop.
    pub async fn transcode(&self, src: &Path) -> Result<PathBuf, Error> {
        let file_stem = src.file_stem().and_then(|s| s.to_str()).unwrap_or("track");
        let dst = self.scratch_dir.join(format!("{file_stem}.mp3"));

        tracing::info!(src = %src.display(), dst = %dst.display(), "transcoding to mp3");
        let status = tokio::process::Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(src)
            .args(["-codec:a", "libmp3lame"])
            .args(["-b:a", &format!("{}k", self.bitrate_kbps)])
            .arg(&dst)
            .status()
            .await
            .map_err(|err| Error::Transcode {
                src: src.to_owned(),
                reason: format!("failed to start ffmpeg: {err}"),
            })?;

        if !status.success() {
            return Err(Error::Transcode {
                src: src.to_owned(),
                reason: format!("ffmpeg exited with {status}"),
            });
        }
        Ok(dst)
    }
}

impl Drop for Transcoder {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.scratch_dir) {
            tracing::warn!(dir = %self.scratch_dir.display(), error = %err, "failed to clean up scratch directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_formats_are_recognized_case_insensitively() {
        assert!(is_native_format("MP3"));
        assert!(is_native_format("flac"));
        assert!(!is_native_format("ape"));
        assert!(!is_native_format("wv"));
    }
}
