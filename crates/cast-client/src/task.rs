use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::channel::{self, Responder};
use crate::proto::CastMessage;
use crate::provider::{Command, Status};
use crate::ConnectState;

/// Sends a PING on the heartbeat channel every 5 seconds until cancelled.
pub async fn heartbeat(token: CancellationToken, command: mpsc::UnboundedSender<Command>) {
    let mut tick = interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tick.tick() => {
                if command.send(Command::Ping).is_err() {
                    return;
                }
            }
        }
    }
}

/// Polls receiver and (when a media session is active) media status once a
/// second, per the sender's poll interval.
pub async fn poll_status(
    token: CancellationToken,
    state: Arc<RwLock<ConnectState>>,
    command: mpsc::UnboundedSender<Command>,
) {
    let mut tick = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tick.tick() => {
                if command.send(Command::ReceiverStatus).is_err() {
                    return;
                }
                let media_connection = state.read().await.media_connection();
                if let Some(connect) = media_connection {
                    if command.send(Command::MediaStatus(connect)).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Drives inbound messages from the transport into the channel responders
/// until the stream ends or is cancelled. A clean cancellation (explicit
/// `disconnect()`) returns without touching `status`; the stream ending on
/// its own means the receiver closed the socket out from under us, which is
/// a fatal transport failure and gets an `Status::Error` so callers can
/// tell it apart from a clean shutdown instead of just seeing `status_rx`
/// yield `None`.
pub async fn respond(
    mut source: impl futures::Stream<Item = std::io::Result<CastMessage>> + Unpin,
    responder: Responder,
    status: mpsc::UnboundedSender<Status>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            message = source.next() => {
                let message = match message {
                    Some(Ok(message)) => message,
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "error reading cast message");
                        continue;
                    }
                    None => {
                        tracing::warn!("cast transport closed unexpectedly");
                        let _ = status.send(Status::Error("cast transport closed".into()));
                        return;
                    }
                };
                if let Err(err) = responder.handle(&message).await {
                    tracing::warn!(error = %err, "responder handler error");
                }
            }
        }
    }
}

/// Turns queued `Command`s into wire messages and writes them to the TLS
/// sink until the command channel is closed or cancelled. Each command is
/// assigned its own monotonic request id; a `0` request id is reserved for
/// spontaneous messages from the receiver, so the counter starts at 1.
pub async fn send(
    mut sink: impl futures::Sink<CastMessage, Error = std::io::Error> + Unpin,
    mut commands: mpsc::UnboundedReceiver<Command>,
    request_id: Arc<AtomicI64>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            command = commands.recv() => {
                let Some(command) = command else { return };
                let id = request_id.fetch_add(1, Ordering::Relaxed) + 1;
                let message = to_message(id, command);
                if let Err(err) = sink.send(message).await {
                    tracing::warn!(error = %err, "error writing cast message");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as futures_mpsc;

    /// Request id 0 is reserved for spontaneous receiver messages, so the
    /// first command dispatched must be assigned 1, not 0.
    #[tokio::test]
    async fn request_ids_start_at_one_and_increase_monotonically() {
        let (sink, mut sent) = futures_mpsc::unbounded::<CastMessage>();
        let sink = sink.sink_map_err(|_| std::io::Error::other("closed"));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let request_id = Arc::new(AtomicI64::new(0));
        let token = CancellationToken::new();

        let handle = tokio::spawn(send(sink, command_rx, request_id, token.clone()));

        command_tx.send(Command::ReceiverStatus).unwrap();
        command_tx.send(Command::ReceiverStatus).unwrap();
        drop(command_tx);
        handle.await.unwrap();

        let first = sent.next().await.unwrap();
        let second = sent.next().await.unwrap();
        assert_eq!(request_id_of(&first), 1);
        assert_eq!(request_id_of(&second), 2);
    }

    fn request_id_of(message: &CastMessage) -> i64 {
        let payload: serde_json::Value = serde_json::from_str(message.payload_utf8()).unwrap();
        payload["requestId"].as_i64().unwrap()
    }
}

fn to_message(request_id: i64, command: Command) -> CastMessage {
    match command {
        Command::Close(destination) => channel::connection::close(&destination),
        Command::Connect(connect) => channel::connection::connect(&connect.transport),
        Command::Launch { app_id } => channel::receiver::launch(request_id, &app_id),
        Command::Load { connect, media } => channel::media::load(request_id, &connect, *media),
        Command::MediaStatus(connect) => channel::media::status(request_id, &connect),
        Command::Pause(connect) => channel::media::pause(request_id, &connect),
        Command::Ping => channel::heartbeat::ping(),
        Command::Play(connect) => channel::media::play(request_id, &connect),
        Command::Pong => channel::heartbeat::pong(),
        Command::ReceiverStatus => channel::receiver::status(request_id),
        Command::Seek {
            connect,
            position_secs,
        } => channel::media::seek(request_id, &connect, position_secs),
        Command::Stop(connect) => channel::media::stop(request_id, &connect),
        Command::VolumeLevel { level } => channel::receiver::set_volume_level(request_id, level),
        Command::VolumeMute { muted } => channel::receiver::set_volume_muted(request_id, muted),
    }
}
