//! Output adapter, device discovery, and transcoding that sit between a
//! host media player and [`cast_client`]: decide native vs. transcoded
//! playback path, register the servable file with [`cast_media_server`],
//! and drive the Cast session machine from host player events.

mod adapter;
mod clock;
mod config;
mod device;
mod discovery;
mod error;
mod transcode;

pub use adapter::{HostEvent, OutputAdapter, PlayState};
pub use clock::PositionClock;
pub use config::BridgeConfig;
pub use device::DeviceInfo;
pub use discovery::discover;
pub use error::Error;
pub use transcode::Transcoder;
