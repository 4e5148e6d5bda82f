//! Command-line front end: browse for Cast devices, or push a local file to
//! one and keep it playing until the file ends or the user interrupts.

mod cli;
mod config;

use std::sync::Arc;

use cast_bridge::{DeviceInfo, HostEvent, OutputAdapter, PlayState, Transcoder};
use cast_client::Status;
use cast_media_server::MediaServer;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::resolve(&args)?;

    match &args.cmd {
        cli::Command::Discover => {
            let devices = cast_bridge::discover(config.discovery_timeout).await;
            if devices.is_empty() {
                println!("no Cast devices found");
            }
            for device in &devices {
                println!("{}\t{}\t{}", device.friendly_name, device.model, device.socket_addr());
            }
            Ok(())
        }
        cli::Command::Play { path, device } => play(path, device, &config).await,
    }
}

async fn play(
    path: &std::path::Path,
    device_name: &str,
    config: &cast_bridge::BridgeConfig,
) -> anyhow::Result<()> {
    let devices = cast_bridge::discover(config.discovery_timeout).await;
    let target = select_device(&devices, device_name)
        .ok_or_else(|| anyhow::anyhow!("no Cast device matching '{device_name}' found"))?;
    tracing::info!(name = %target.friendly_name, addr = %target.socket_addr(), "connecting");

    let server = Arc::new(MediaServer::start(config.server_port, config.bind_address).await?);
    let transcoder = Transcoder::new(config.transcode_bitrate_kbps)?;
    let (client, mut status_rx) = cast_client::connect_to(target.socket_addr()).await?;
    let mut adapter = OutputAdapter::new(client, server, transcoder);

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_owned();

    loop {
        tokio::select! {
            status = status_rx.recv() => {
                let Some(status) = status else {
                    anyhow::bail!("cast session closed");
                };
                handle_status(&mut adapter, &status, path, &title).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping playback");
                adapter.handle_event(HostEvent::PlayState(PlayState::Stopped)).await?;
                adapter.shutdown().await;
                return Ok(());
            }
        }
    }
}

async fn handle_status(
    adapter: &mut OutputAdapter,
    status: &Status,
    path: &std::path::Path,
    title: &str,
) -> anyhow::Result<()> {
    adapter.on_status(status).await;
    if matches!(status, Status::Connected(_)) {
        adapter
            .handle_event(HostEvent::TrackStarted {
                path: path.to_owned(),
                title: title.to_owned(),
                artist: String::new(),
                album: String::new(),
            })
            .await?;
    }
    if matches!(status, Status::MediaConnected(_)) {
        adapter
            .handle_event(HostEvent::PlayState(PlayState::Playing))
            .await?;
    }
    Ok(())
}

fn select_device<'a>(devices: &'a [DeviceInfo], needle: &str) -> Option<&'a DeviceInfo> {
    devices
        .iter()
        .find(|device| device.friendly_name.to_lowercase().contains(&needle.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn device(name: &str) -> DeviceInfo {
        DeviceInfo::new(Ipv4Addr::new(192, 168, 1, 10), 8009, name.to_owned(), "Chromecast".to_owned())
    }

    #[test]
    fn matches_by_case_insensitive_substring() {
        let devices = vec![device("Kitchen Speaker"), device("Living Room")];
        let found = select_device(&devices, "kitchen").unwrap();
        assert_eq!(found.friendly_name, "Kitchen Speaker");
    }

    #[test]
    fn no_match_returns_none() {
        let devices = vec![device("Kitchen Speaker")];
        assert!(select_device(&devices, "bedroom").is_none());
    }
}
