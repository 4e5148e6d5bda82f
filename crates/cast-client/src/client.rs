use std::net::SocketAddr;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::channel::{self, Responder};
use crate::provider::{Command, ConnectState, Media, MediaConnection, ReceiverConnection, Status};
use crate::{task, transport, Error};

/// 10 seconds from `connect_to` to reaching `Connected`. Covers the raw
/// TCP+TLS handshake (enforced by [`transport::connect`]) and everything
/// after it up to the first RECEIVER_STATUS that lands a session; on expiry
/// every background task is cancelled and an `Error` status is emitted.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A live connection to a single Cast receiver. Dropping or calling
/// [`Client::shutdown`] tears down every background task associated with
/// the session.
pub struct Client {
    command: mpsc::UnboundedSender<Command>,
    connect: Arc<RwLock<ConnectState>>,
    status: mpsc::UnboundedSender<Status>,
    shutdown: CancellationToken,
}

impl Client {
    /// Entry point into the session machine: connects the virtual channel
    /// to the platform receiver and asks for its current status. The
    /// `receiver` channel's RECEIVER_STATUS handler decides from the reply
    /// whether to LAUNCH the Default Media Receiver or, if it's already the
    /// running app, skip straight to connecting to its transport - this
    /// function never launches unconditionally.
    pub fn launch_default_receiver(&self) -> Result<(), Error> {
        self.command
            .send(Command::Connect(ReceiverConnection {
                session: channel::DEFAULT_DESTINATION_ID.to_owned(),
                transport: channel::DEFAULT_DESTINATION_ID.to_owned(),
            }))
            .and_then(|_| self.command.send(Command::ReceiverStatus))
            .map_err(|_| Error::Protocol("command channel closed".into()))
    }

    pub async fn load(&self, receiver: ReceiverConnection, media: Media) -> Result<(), Error> {
        crate::session::invalidate(&self.connect).await;
        self.command
            .send(Command::Load {
                connect: receiver,
                media: Box::new(media),
            })
            .map_err(|_| Error::Protocol("command channel closed".into()))
    }

    /// Rejected locally (never sent) when no media session has been
    /// established yet, per the PLAY/PAUSE/STOP/SEEK gating rule.
    pub async fn play(&self, connect: &MediaConnection) -> Result<(), Error> {
        self.send_if_has_session(Command::Play(connect.clone()))
            .await
    }

    pub async fn pause(&self, connect: &MediaConnection) -> Result<(), Error> {
        self.send_if_has_session(Command::Pause(connect.clone()))
            .await
    }

    pub async fn stop(&self, connect: &MediaConnection) -> Result<(), Error> {
        self.send_if_has_session(Command::Stop(connect.clone()))
            .await
    }

    pub async fn seek(&self, connect: &MediaConnection, position_secs: f64) -> Result<(), Error> {
        self.send_if_has_session(Command::Seek {
            connect: connect.clone(),
            position_secs,
        })
        .await
    }

    pub fn set_volume_level(&self, level: f64) -> Result<(), Error> {
        self.command
            .send(Command::VolumeLevel { level })
            .map_err(|_| Error::Protocol("command channel closed".into()))
    }

    pub fn set_volume_muted(&self, muted: bool) -> Result<(), Error> {
        self.command
            .send(Command::VolumeMute { muted })
            .map_err(|_| Error::Protocol("command channel closed".into()))
    }

    async fn send_if_has_session(&self, command: Command) -> Result<(), Error> {
        if self.connect.read().await.media_connection().is_none() {
            return Err(Error::Protocol("no media session established yet".into()));
        }
        self.command
            .send(command)
            .map_err(|_| Error::Protocol("command channel closed".into()))
    }

    /// Sends CLOSE on the app transport (if a session was ever established)
    /// and on `receiver-0`, then tears down every background task. Per
    /// spec's `disconnect()` contract, both CLOSE frames are best-effort:
    /// they're queued before the cancellation token is flipped, but nothing
    /// waits for the receiver to acknowledge them.
    pub async fn shutdown(&self) {
        if let Some(connect) = self.connect.read().await.receiver_connection() {
            if connect.transport != channel::DEFAULT_DESTINATION_ID {
                let _ = self.command.send(Command::Close(connect.transport));
            }
        }
        let _ = self
            .command
            .send(Command::Close(channel::DEFAULT_DESTINATION_ID.to_owned()));
        let _ = self.status.send(Status::Disconnecting);
        self.shutdown.cancel();
    }
}

/// Watches the full Connecting→Connected window. If `Connected` hasn't
/// landed by the time `budget` elapses, emits an `Error` status and cancels
/// every background task, closing the channel per the session machine's
/// `--10s timer--> Error` transition. A `disconnect()` racing the same
/// deadline wins the select and this task exits quietly instead.
async fn connect_watchdog(
    state: Arc<RwLock<ConnectState>>,
    status: mpsc::UnboundedSender<Status>,
    shutdown: CancellationToken,
    budget: Duration,
) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(budget) => {
            if state.read().await.receiver_connection().is_none() {
                tracing::warn!("connection timed out before reaching Connected");
                let _ = status.send(Status::Error("connect timed out before Connected".into()));
                shutdown.cancel();
            }
        }
    }
}

/// Connects to a Cast device at `addr`, establishes the virtual connection
/// to the platform receiver, and spawns the background tasks that keep the
/// session alive (heartbeat, status polling, message dispatch). Returns the
/// `Client` handle and a channel of `Status` events observers can consume.
pub async fn connect_to(
    addr: SocketAddr,
) -> Result<(Client, mpsc::UnboundedReceiver<Status>), Error> {
    let connect_started = Instant::now();
    let framed = transport::connect(addr, CONNECT_TIMEOUT).await?;
    let (sink, source) = framed.split();

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let connect_state = Arc::new(RwLock::new(ConnectState::default()));
    let shutdown = CancellationToken::new();
    let request_id = Arc::new(AtomicI64::new(0));

    let responder = Responder::new(connect_state.clone(), command_tx.clone(), status_tx.clone());
    tokio::spawn(task::respond(
        source,
        responder,
        status_tx.clone(),
        shutdown.clone(),
    ));
    tokio::spawn(task::send(sink, command_rx, request_id, shutdown.clone()));
    tokio::spawn(task::heartbeat(shutdown.clone(), command_tx.clone()));
    tokio::spawn(task::poll_status(
        shutdown.clone(),
        connect_state.clone(),
        command_tx.clone(),
    ));

    let handshake_budget = CONNECT_TIMEOUT.saturating_sub(connect_started.elapsed());
    tokio::spawn(connect_watchdog(
        connect_state.clone(),
        status_tx.clone(),
        shutdown.clone(),
        handshake_budget,
    ));

    let client = Client {
        command: command_tx,
        connect: connect_state,
        status: status_tx,
        shutdown,
    };
    client.launch_default_receiver()?;

    Ok((client, status_rx))
}
