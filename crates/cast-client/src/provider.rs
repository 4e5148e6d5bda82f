use std::fmt;

use url::Url;

use crate::channel::media::MediaStatus;

#[derive(Clone, Debug)]
pub struct Media {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub url: Url,
    pub cover: Option<Image>,
    pub content_type: String,
    pub duration: Option<f64>,
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref artist) = self.artist {
            parts.push(artist.clone());
        }
        if let Some(ref title) = self.title {
            parts.push(title.clone());
        }
        if let Some(ref album) = self.album {
            parts.push(album.clone());
        }
        write!(f, "{}", parts.join(" -- "))
    }
}

#[derive(Clone, Debug)]
pub struct Image {
    pub url: Url,
    pub dimensions: (u32, u32),
}

/// Commands flowing from `Client` methods into the write-side task, which
/// turns each into a wire message and assigns it a request id.
#[derive(Debug)]
pub enum Command {
    Close(String),
    Connect(ReceiverConnection),
    Launch {
        app_id: String,
    },
    Load {
        connect: ReceiverConnection,
        media: Box<Media>,
    },
    MediaStatus(MediaConnection),
    Pause(MediaConnection),
    Ping,
    Play(MediaConnection),
    Pong,
    ReceiverStatus,
    Seek {
        connect: MediaConnection,
        position_secs: f64,
    },
    Stop(MediaConnection),
    VolumeLevel {
        level: f64,
    },
    VolumeMute {
        muted: bool,
    },
}

/// Events flowing out of the responder task to anyone observing the client.
#[derive(Debug)]
pub enum Status {
    Connected(Box<ReceiverConnection>),
    MediaConnected(Box<MediaConnection>),
    MediaState(Box<MediaStatus>),
    LoadCancelled,
    LoadFailed,
    InvalidPlayerState,
    InvalidRequest(Option<String>),
    /// `disconnect()` was called; CLOSE frames are queued and every
    /// background task is about to be cancelled.
    Disconnecting,
    /// A fatal transport failure or a connect timeout. Indistinguishable
    /// from each other to the caller, per the session machine's contract.
    Error(String),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum SessionLifecycle {
    #[default]
    Init,
    Established,
    NoMediaSession,
}

#[derive(Debug, Default)]
pub struct ConnectState {
    session: Option<String>,
    transport: Option<String>,
    media_session: Option<i64>,
    pub lifecycle: SessionLifecycle,
}

impl ConnectState {
    pub fn receiver_connection(&self) -> Option<ReceiverConnection> {
        let session = self.session.as_ref()?;
        let transport = self.transport.as_ref()?;
        Some(ReceiverConnection {
            session: session.to_owned(),
            transport: transport.to_owned(),
        })
    }

    pub fn media_connection(&self) -> Option<MediaConnection> {
        match self.lifecycle {
            SessionLifecycle::Init | SessionLifecycle::NoMediaSession => None,
            SessionLifecycle::Established => {
                let receiver = self.receiver_connection()?;
                let session = self.media_session?;
                Some(MediaConnection { receiver, session })
            }
        }
    }

    /// Returns whether a media session is currently assigned, gating
    /// PLAY/PAUSE/STOP/SEEK as spec'd: those commands are rejected locally
    /// (never sent) before the receiver has reported a `media_session_id`.
    pub fn has_media_session(&self) -> bool {
        self.media_session.is_some()
    }

    pub fn set_session(&mut self, session: Option<&str>) -> bool {
        let changed = self.session.as_deref() != session;
        if changed {
            self.session = session.map(String::from);
        }
        changed
    }

    pub fn set_transport(&mut self, transport: Option<&str>) -> bool {
        let changed = self.transport.as_deref() != transport;
        if changed {
            self.transport = transport.map(String::from);
        }
        changed
    }

    pub fn set_media_session(&mut self, media_session: Option<i64>) -> bool {
        let changed = self.media_session != media_session;
        if changed {
            self.media_session = media_session;
        }
        changed
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiverConnection {
    pub session: String,
    pub transport: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaConnection {
    pub receiver: ReceiverConnection,
    pub session: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_media_session_until_connect_and_load_both_land() {
        let mut state = ConnectState::default();
        assert!(!state.has_media_session());
        assert!(state.media_connection().is_none());

        state.set_session(Some("session-1"));
        state.set_transport(Some("transport-1"));
        assert!(state.media_connection().is_none(), "receiver fields alone don't grant a media session");

        state.set_media_session(Some(42));
        assert!(state.has_media_session());
        assert!(
            state.media_connection().is_none(),
            "media_session_id alone isn't enough without lifecycle == Established"
        );

        state.lifecycle = SessionLifecycle::Established;
        let connect = state.media_connection().expect("established with all fields set");
        assert_eq!(connect.session, 42);
        assert_eq!(connect.receiver.session, "session-1");
        assert_eq!(connect.receiver.transport, "transport-1");
    }

    #[test]
    fn no_media_session_reports_none_even_with_stale_session_id() {
        let mut state = ConnectState::default();
        state.set_session(Some("session-1"));
        state.set_transport(Some("transport-1"));
        state.set_media_session(Some(7));
        state.lifecycle = SessionLifecycle::NoMediaSession;

        assert!(state.has_media_session(), "the id itself is still tracked");
        assert!(
            state.media_connection().is_none(),
            "NoMediaSession must block PLAY/PAUSE/STOP/SEEK even if a stale id lingers"
        );
    }

    #[test]
    fn setters_report_whether_the_value_actually_changed() {
        let mut state = ConnectState::default();
        assert!(state.set_session(Some("a")));
        assert!(!state.set_session(Some("a")), "re-setting the same value is not a change");
        assert!(state.set_session(Some("b")));

        assert!(state.set_media_session(Some(1)));
        assert!(!state.set_media_session(Some(1)));
        assert!(state.set_media_session(None));
    }
}
