use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc::UnboundedSender, RwLock};

use crate::proto::{CastMessage, CastMessage_PayloadType, CastMessage_ProtocolVersion};
use crate::{Command, ConnectState, Status};

pub mod connection;
pub mod heartbeat;
pub mod media;
pub mod receiver;

pub const DEFAULT_DESTINATION_ID: &str = "receiver-0";
pub const DEFAULT_MEDIA_RECEIVER_APP_ID: &str = "CC1AD845";
pub const DEFAULT_SENDER_ID: &str = "sender-0";

/// Cast channels dispatch on namespace; a message that matches no handler's
/// namespace is reported back up rather than dropped silently.
pub trait Handler {
    type Payload: DeserializeOwned;

    fn namespace(&self) -> &'static str;

    fn channel(&self) -> &'static str;

    async fn handle(&self, payload: Self::Payload) -> Result<(), crate::Error>;

    async fn try_handle(&self, message: &CastMessage) -> Result<Option<()>, crate::Error> {
        if message.namespace() != self.namespace() {
            return Ok(None);
        }
        tracing::trace!(channel = self.channel(), "found message for channel");
        let payload: Self::Payload = serde_json::from_str(message.payload_utf8())
            .map_err(|_| crate::Error::Parse(self.channel()))?;
        self.handle(payload).await.map(Some)
    }
}

/// Dispatches an inbound `CastMessage` to whichever channel handler owns its
/// namespace, in order of expected receive frequency (media status and
/// heartbeats dominate traffic once a session is established).
pub struct Responder {
    connection: connection::Handler,
    heartbeat: heartbeat::Handler,
    media: media::Handler,
    receiver: receiver::Handler,
}

impl Responder {
    pub fn new(
        connect: Arc<RwLock<ConnectState>>,
        command: UnboundedSender<Command>,
        status: UnboundedSender<Status>,
    ) -> Self {
        Self {
            connection: connection::Handler,
            heartbeat: heartbeat::Handler::new(command.clone()),
            media: media::Handler::new(connect.clone(), command.clone(), status.clone()),
            receiver: receiver::Handler::new(connect, command, status),
        }
    }

    pub async fn handle(&self, message: &CastMessage) -> Result<(), crate::Error> {
        if self.media.try_handle(message).await?.is_some() {
            return Ok(());
        }
        if self.receiver.try_handle(message).await?.is_some() {
            return Ok(());
        }
        if self.heartbeat.try_handle(message).await?.is_some() {
            return Ok(());
        }
        if self.connection.try_handle(message).await?.is_some() {
            return Ok(());
        }
        tracing::warn!(namespace = message.namespace(), "message on unknown channel");
        Err(crate::Error::UnknownChannel(message.namespace().to_owned()))
    }
}

#[derive(Debug, Default)]
pub struct MessageBuilder<'a> {
    namespace: Option<&'a str>,
    source: Option<&'a str>,
    destination: Option<&'a str>,
    payload: Option<String>,
}

impl<'a> MessageBuilder<'a> {
    pub fn namespace(mut self, namespace: &'a str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn destination(mut self, destination: &'a str) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn payload<T: Serialize>(mut self, payload: &T) -> Self {
        if let Ok(payload) = serde_json::to_string(payload) {
            self.payload = Some(payload);
        }
        self
    }

    pub fn into_message(mut self) -> CastMessage {
        let mut message = CastMessage::new();
        message.set_protocol_version(CastMessage_ProtocolVersion::CASTV2_1_0);
        if let Some(source) = self.source.take() {
            message.set_source_id(source.to_owned());
        }
        if let Some(destination) = self.destination.take() {
            message.set_destination_id(destination.to_owned());
        }
        if let Some(namespace) = self.namespace.take() {
            message.set_namespace(namespace.to_owned());
        }
        if let Some(payload) = self.payload.take() {
            message.set_payload_type(CastMessage_PayloadType::STRING);
            message.set_payload_utf8(payload);
        }
        message
    }
}
