use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::channel::{self, MessageBuilder, DEFAULT_DESTINATION_ID, DEFAULT_SENDER_ID};
use crate::proto::CastMessage;
use crate::{Command, Error};

const CHANNEL: &str = "heartbeat";
const NAMESPACE: &str = "urn:x-cast:com.google.cast.tp.heartbeat";

#[derive(Debug)]
pub struct Handler {
    command: UnboundedSender<Command>,
}

impl Handler {
    pub fn new(command: UnboundedSender<Command>) -> Self {
        Self { command }
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
        tracing::trace!(channel = self.channel(), ?payload, "heartbeat received");
        match payload {
            Response::Ping => self
                .command
                .send(Command::Pong)
                .map_err(|_| Error::Protocol("heartbeat command channel closed".into())),
            Response::Pong => Ok(()),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Ping,
    Pong,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Ping,
    Pong,
}

pub fn ping() -> CastMessage {
    MessageBuilder::default()
        .namespace(NAMESPACE)
        .source(DEFAULT_SENDER_ID)
        .destination(DEFAULT_DESTINATION_ID)
        .payload(&Request::Ping)
        .into_message()
}

pub fn pong() -> CastMessage {
    MessageBuilder::default()
        .namespace(NAMESPACE)
        .source(DEFAULT_SENDER_ID)
        .destination(DEFAULT_DESTINATION_ID)
        .payload(&Request::Pong)
        .into_message()
}
