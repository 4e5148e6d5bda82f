//! Framed-TLS transport and session state machine for the Google Cast v2
//! wire protocol: connect to a receiver, launch the Default Media Receiver,
//! and drive playback over the `receiver` and `media` channels.

mod channel;
mod client;
mod codec;
mod error;
#[allow(clippy::all)]
mod proto;
mod provider;
mod session;
mod task;
mod transport;

pub use client::{connect_to, Client};
pub use error::Error;
pub use provider::{
    Command, ConnectState, Image, Media, MediaConnection, ReceiverConnection, SessionLifecycle,
    Status,
};

pub use channel::media::{IdleReason, MediaStatus, PlayerState};
pub use channel::receiver::Volume;
