//! Command-line interface definitions. Kept free of audio/session logic so
//! the wiring in `main.rs` stays the only place that touches `cast-bridge`.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cast-bridge")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Port the media server listens on for registered files.
    #[arg(long)]
    pub server_port: Option<u16>,

    /// Milliseconds to browse for Cast devices before giving up.
    #[arg(long)]
    pub discovery_timeout_ms: Option<u64>,

    /// Override LAN address detection (for multi-homed hosts).
    #[arg(long)]
    pub bind_address: Option<Ipv4Addr>,

    /// Bitrate in kbps used when transcoding a non-native file to mp3.
    #[arg(long)]
    pub transcode_bitrate_kbps: Option<u32>,

    /// Optional TOML config file; CLI flags override values it sets.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse for Cast devices and print each one found.
    Discover,

    /// Play a local file on a Cast device, selected by substring match
    /// against its friendly name.
    Play {
        /// Path to the audio file.
        path: PathBuf,

        /// Substring of the target device's friendly name.
        #[arg(long)]
        device: String,
    },
}
