use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{ConnectState, MediaConnection, SessionLifecycle};

/// Registers a media session id with the shared connection state. Returns
/// `Some(connection)` if the registration caused the media session id to
/// change (i.e. this is a newly established session), `None` if the status
/// update just reconfirmed the existing session.
pub(crate) async fn register(
    state: &Arc<RwLock<ConnectState>>,
    session: i64,
) -> Option<MediaConnection> {
    let mut state = state.write().await;
    if state.set_media_session(Some(session)) {
        tracing::debug!(session, "media session established");
        state.lifecycle = SessionLifecycle::Established;
        state.media_connection()
    } else {
        None
    }
}

/// Invalidates the current media session id. This stops the status-polling
/// task from asking the receiver for media status on a session that no
/// longer exists, e.g. right after a new LOAD has been dispatched.
pub(crate) async fn invalidate(state: &Arc<RwLock<ConnectState>>) {
    let mut state = state.write().await;
    tracing::debug!("media session invalidated");
    state.lifecycle = SessionLifecycle::NoMediaSession;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_reports_the_connection_only_on_a_new_session_id() {
        let state = Arc::new(RwLock::new(ConnectState::default()));
        state.write().await.set_session(Some("s"));
        state.write().await.set_transport(Some("t"));

        let first = register(&state, 1).await;
        assert!(first.is_some(), "first registration of a session id is new");
        assert_eq!(state.read().await.lifecycle, SessionLifecycle::Established);

        let repeat = register(&state, 1).await;
        assert!(repeat.is_none(), "reconfirming the same session id is not a new connection");
    }

    #[tokio::test]
    async fn invalidate_blocks_media_connection_until_a_new_session_registers() {
        let state = Arc::new(RwLock::new(ConnectState::default()));
        state.write().await.set_session(Some("s"));
        state.write().await.set_transport(Some("t"));
        register(&state, 1).await;
        assert!(state.read().await.media_connection().is_some());

        invalidate(&state).await;
        assert!(state.read().await.media_connection().is_none());

        let reconnected = register(&state, 2).await;
        assert!(reconnected.is_some());
        assert!(state.read().await.media_connection().is_some());
    }
}
