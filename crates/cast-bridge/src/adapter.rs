use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cast_client::{Client, MediaConnection, ReceiverConnection, Status};
use cast_media_server::MediaServer;

use crate::clock::PositionClock;
use crate::transcode::{is_native_format, Transcoder};
use crate::Error;

/// A jump larger than this between consecutive position reports is treated
/// as a user seek rather than ordinary playback drift.
const SEEK_JUMP_THRESHOLD: Duration = Duration::from_millis(1_000);

/// Events a host media player feeds into the bridge. Mirrors spec §1's
/// `{track-started, play-state, volume, seek}` surface; host UI, settings
/// storage, and metadata/cover extraction stay outside this crate.
#[derive(Clone, Debug)]
pub enum HostEvent {
    TrackStarted {
        path: PathBuf,
        title: String,
        artist: String,
        album: String,
    },
    PlayState(PlayState),
    Volume(f64),
    Position(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
    Stopped,
}

/// A `load()` deferred because `track_started` fired before the receiver
/// connection was available, replayed once on the next `Status::Connected`.
struct PendingMedia {
    media: cast_client::Media,
}

/// Turns [`HostEvent`]s into [`cast_client::Client`] calls, deciding between
/// the original file and a transcoded one and registering whichever is
/// servable with the media server before calling `play`.
pub struct OutputAdapter {
    client: Client,
    server: Arc<MediaServer>,
    transcoder: Transcoder,
    clock: PositionClock,
    receiver_connection: Option<ReceiverConnection>,
    media_connection: Option<MediaConnection>,
    current_path: Option<PathBuf>,
    pending_media: Option<PendingMedia>,
    paused: bool,
}

impl OutputAdapter {
    pub fn new(client: Client, server: Arc<MediaServer>, transcoder: Transcoder) -> Self {
        Self {
            client,
            server,
            transcoder,
            clock: PositionClock::default(),
            receiver_connection: None,
            media_connection: None,
            current_path: None,
            pending_media: None,
            paused: false,
        }
    }

    /// Feeds a [`Status`] event observed from the session machine's
    /// observer channel. `Connected` gives the receiver connection `load`
    /// needs, and replays a `PendingMedia` left over from a `track_started`
    /// that fired before the connection existed. `MediaConnected` gives the
    /// media session PLAY/PAUSE/STOP/SEEK are gated on.
    pub async fn on_status(&mut self, status: &Status) {
        match status {
            Status::Connected(connect) => {
                self.receiver_connection = Some((**connect).clone());
                if let Some(pending) = self.pending_media.take() {
                    if let Err(err) = self.client.load((**connect).clone(), pending.media).await {
                        tracing::warn!(error = %err, "failed to replay pending media on connect");
                    }
                }
            }
            Status::MediaConnected(connect) => self.media_connection = Some((**connect).clone()),
            _ => {}
        }
    }

    pub async fn handle_event(&mut self, event: HostEvent) -> Result<(), Error> {
        match event {
            HostEvent::TrackStarted {
                path,
                title,
                artist,
                album,
            } => self.track_started(path, title, artist, album).await,
            HostEvent::PlayState(state) => self.play_state(state).await,
            HostEvent::Volume(level) => {
                self.client.set_volume_level(level.clamp(0.0, 1.0))?;
                Ok(())
            }
            HostEvent::Position(position) => self.report_position(position).await,
        }
    }

    async fn track_started(
        &mut self,
        path: PathBuf,
        title: String,
        artist: String,
        album: String,
    ) -> Result<(), Error> {
        if self.current_path.as_deref() != Some(path.as_path()) {
            if let Some(connect) = self.media_connection.clone() {
                let _ = self.client.stop(&connect).await;
            }
            self.clock.start();
        }

        let servable_path = self.servable_path(&path).await?;
        let url = self.server.register(&servable_path).await;

        let extension = servable_path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        let media = cast_client::Media {
            title: Some(title),
            artist: Some(artist),
            album: Some(album),
            url,
            cover: None,
            content_type: load_content_type(extension).to_owned(),
            duration: None,
        };

        if let Some(connect) = self.receiver_connection.clone() {
            self.client.load(connect, media).await?;
            self.pending_media = None;
        } else {
            self.pending_media = Some(PendingMedia { media });
        }

        self.current_path = Some(path);
        self.paused = false;
        Ok(())
    }

    async fn play_state(&mut self, state: PlayState) -> Result<(), Error> {
        let Some(connect) = self.media_connection.clone() else {
            return Ok(());
        };
        match state {
            PlayState::Playing if self.paused => {
                self.clock.resume();
                self.paused = false;
                self.client.play(&connect).await?;
            }
            PlayState::Playing => {}
            PlayState::Paused => {
                self.clock.pause();
                self.paused = true;
                self.client.pause(&connect).await?;
            }
            PlayState::Stopped => {
                self.paused = false;
                self.client.stop(&connect).await?;
            }
        }
        Ok(())
    }

    async fn report_position(&mut self, position: Duration) -> Result<(), Error> {
        let Some(connect) = self.media_connection.clone() else {
            return Ok(());
        };
        let expected = self.clock.elapsed();
        let delta = expected.abs_diff(position);
        if delta > SEEK_JUMP_THRESHOLD {
            self.clock.rebase(position);
            self.client.seek(&connect, position.as_secs_f64()).await?;
        }
        Ok(())
    }

    /// Position to surface to the host: the local clock, which spec
    /// resolves as authoritative over the receiver's coarser `currentTime`.
    pub fn position(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Corrects the local clock toward a receiver-polled `currentTime`.
    pub fn correct_position(&mut self, receiver_position: Duration) {
        self.clock.correct_toward(receiver_position);
    }

    /// Tears down the underlying Cast session, sending CLOSE on teardown.
    pub async fn shutdown(&self) {
        self.client.shutdown().await;
    }

    async fn servable_path(&self, path: &Path) -> Result<PathBuf, Error> {
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        if is_native_format(extension) {
            Ok(path.to_owned())
        } else {
            self.transcoder.transcode(path).await
        }
    }
}

/// LOAD's `media.contentType`, distinct from `cast_media_server`'s HTTP
/// `Content-Type` table: the receiver's media pipeline treats `m4a`/`aac`
/// as `audio/aac` rather than the HTTP table's `audio/mp4`, and falls back
/// to `audio/mpeg` rather than `application/octet-stream`.
fn load_content_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "m4a" | "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/wav",
        _ => "audio/mpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_content_type_diverges_from_http_table_for_m4a() {
        assert_eq!(load_content_type("m4a"), "audio/aac");
        assert_eq!(load_content_type("MP3"), "audio/mpeg");
        assert_eq!(load_content_type("unknown"), "audio/mpeg");
    }
}
