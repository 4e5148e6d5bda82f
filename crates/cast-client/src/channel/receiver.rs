use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc::UnboundedSender, RwLock};

use crate::channel::{
    self, MessageBuilder, DEFAULT_DESTINATION_ID, DEFAULT_MEDIA_RECEIVER_APP_ID,
    DEFAULT_SENDER_ID,
};
use crate::proto::CastMessage;
use crate::{Command, ConnectState, Error, Status};

const CHANNEL: &str = "receiver";
const NAMESPACE: &str = "urn:x-cast:com.google.cast.receiver";

#[derive(Debug)]
pub struct Handler {
    connect: Arc<RwLock<ConnectState>>,
    command: UnboundedSender<Command>,
    status: UnboundedSender<Status>,
}

impl Handler {
    pub fn new(
        connect: Arc<RwLock<ConnectState>>,
        command: UnboundedSender<Command>,
        status: UnboundedSender<Status>,
    ) -> Self {
        Self {
            connect,
            command,
            status,
        }
    }
}

impl channel::Handler for Handler {
    type Payload = Response;

    fn channel(&self) -> &'static str {
        CHANNEL
    }

    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    async fn handle(&self, payload: Self::Payload) -> Result<(), Error> {
        let Response::ReceiverStatus { status, .. } = payload;
        tracing::debug!(?status, "RECEIVER_STATUS payload");

        // Any application other than the Default Media Receiver counts as
        // "no media app" here, not just an empty application list - a
        // receiver idling on its backdrop app still reports an
        // `applications` entry on some firmware, so matching on app id
        // rather than emptiness avoids re-launching on top of an
        // already-running media session.
        let app = status
            .applications
            .iter()
            .find(|app| app.app_id == DEFAULT_MEDIA_RECEIVER_APP_ID);

        if app.is_none() {
            if let Some(other) = status.applications.first() {
                tracing::info!(app_id = %other.app_id, "receiver running non-media app, launching default media receiver");
            }
            let _ = self.command.send(Command::Launch {
                app_id: DEFAULT_MEDIA_RECEIVER_APP_ID.to_owned(),
            });
            return Ok(());
        }

        let session = app.map(|app| app.session_id.to_owned());
        let transport = app.map(|app| app.transport_id.to_owned());

        let mut state = self.connect.write().await;
        let session_changed = state.set_session(session.as_deref());
        let transport_changed = state.set_transport(transport.as_deref());
        if !session_changed && !transport_changed {
            return Ok(());
        }
        if let Some(connect) = state.receiver_connection() {
            drop(state);
            tracing::debug!(transport = %connect.transport, "connecting to app transport");
            let _ = self
                .status
                .send(Status::Connected(Box::new(connect.clone())));
            // Connected to the platform receiver; now open the virtual
            // connection to the transport backing the launched app session.
            let _ = self.command.send(Command::Connect(connect));
        }
        Ok(())
    }
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    Launch { request_id: i64, app_id: String },
    #[serde(rename_all = "camelCase")]
    GetStatus { request_id: i64 },
    #[serde(rename_all = "camelCase")]
    SetVolume { request_id: i64, volume: Volume },
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    ReceiverStatus { request_id: i64, status: Status },
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub applications: Vec<Applications>,
    #[serde(default)]
    pub is_active_input: bool,
    pub volume: Volume,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Applications {
    pub app_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    pub session_id: String,
    #[serde(default)]
    pub status_text: String,
    pub transport_id: String,
}

#[derive(Deserialize, Debug)]
pub struct Namespace {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Volume {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
}

pub fn launch(request_id: i64, app_id: &str) -> CastMessage {
    let payload = Request::Launch {
        request_id,
        app_id: app_id.to_owned(),
    };
    MessageBuilder::default()
        .namespace(NAMESPACE)
        .source(DEFAULT_SENDER_ID)
        .destination(DEFAULT_DESTINATION_ID)
        .payload(&payload)
        .into_message()
}

pub fn status(request_id: i64) -> CastMessage {
    let payload = Request::GetStatus { request_id };
    MessageBuilder::default()
        .namespace(NAMESPACE)
        .source(DEFAULT_SENDER_ID)
        .destination(DEFAULT_DESTINATION_ID)
        .payload(&payload)
        .into_message()
}

pub fn set_volume_level(request_id: i64, level: f64) -> CastMessage {
    let payload = Request::SetVolume {
        request_id,
        volume: Volume {
            level: Some(level),
            muted: None,
        },
    };
    MessageBuilder::default()
        .namespace(NAMESPACE)
        .source(DEFAULT_SENDER_ID)
        .destination(DEFAULT_DESTINATION_ID)
        .payload(&payload)
        .into_message()
}

pub fn set_volume_muted(request_id: i64, muted: bool) -> CastMessage {
    let payload = Request::SetVolume {
        request_id,
        volume: Volume {
            level: None,
            muted: Some(muted),
        },
    };
    MessageBuilder::default()
        .namespace(NAMESPACE)
        .source(DEFAULT_SENDER_ID)
        .destination(DEFAULT_DESTINATION_ID)
        .payload(&payload)
        .into_message()
}
