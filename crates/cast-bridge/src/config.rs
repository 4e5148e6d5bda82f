use std::net::Ipv4Addr;
use std::time::Duration;

/// Core-relevant configuration (spec §6), plus the LAN bind-address override
/// spec §9 calls out for multi-homed hosts where first-non-loopback
/// detection picks the wrong interface.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub server_port: u16,
    pub discovery_timeout: Duration,
    pub bind_address: Option<Ipv4Addr>,
    pub transcode_bitrate_kbps: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_port: cast_media_server::DEFAULT_PORT,
            discovery_timeout: Duration::from_millis(10_000),
            bind_address: None,
            transcode_bitrate_kbps: 192,
        }
    }
}
