//! Merges an optional TOML config file with CLI flags into a `BridgeConfig`.
//! CLI flags always win over the file; the file wins over `BridgeConfig`'s
//! own defaults.

use std::net::Ipv4Addr;
use std::path::Path;

use cast_bridge::BridgeConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct FileConfig {
    server_port: Option<u16>,
    discovery_timeout_ms: Option<u64>,
    bind_address: Option<Ipv4Addr>,
    transcode_bitrate_kbps: Option<u32>,
}

fn load(path: &Path) -> anyhow::Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("reading {}: {err}", path.display()))?;
    toml::from_str(&text).map_err(|err| anyhow::anyhow!("parsing {}: {err}", path.display()))
}

/// Builds the effective config: `BridgeConfig::default()` overridden by the
/// file (if any), overridden in turn by whichever CLI flags were given.
pub fn resolve(args: &crate::cli::Args) -> anyhow::Result<BridgeConfig> {
    let mut config = BridgeConfig::default();

    if let Some(path) = &args.config {
        let file = load(path)?;
        if let Some(port) = file.server_port {
            config.server_port = port;
        }
        if let Some(ms) = file.discovery_timeout_ms {
            config.discovery_timeout = std::time::Duration::from_millis(ms);
        }
        if let Some(addr) = file.bind_address {
            config.bind_address = Some(addr);
        }
        if let Some(bitrate) = file.transcode_bitrate_kbps {
            config.transcode_bitrate_kbps = bitrate;
        }
    }

    if let Some(port) = args.server_port {
        config.server_port = port;
    }
    if let Some(ms) = args.discovery_timeout_ms {
        config.discovery_timeout = std::time::Duration::from_millis(ms);
    }
    if let Some(addr) = args.bind_address {
        config.bind_address = Some(addr);
    }
    if let Some(bitrate) = args.transcode_bitrate_kbps {
        config.transcode_bitrate_kbps = bitrate;
    }

    Ok(config)
}
