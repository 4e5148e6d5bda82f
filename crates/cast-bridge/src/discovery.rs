use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent};

use crate::device::DeviceInfo;

const SERVICE_TYPE: &str = "_googlecast._tcp.local.";

/// Browses `_googlecast._tcp.local.` for `timeout`, then returns every
/// resolved device found, de-duplicated by [`DeviceInfo::id`]. A device seen
/// more than once is reported once with `available` left `true` rather than
/// inserted again, matching the de-dupe-by-id behavior of the C++ discovery
/// manager this is ported from.
pub async fn discover(timeout: Duration) -> Vec<DeviceInfo> {
    let daemon = match ServiceDaemon::new() {
        Ok(daemon) => daemon,
        Err(err) => {
            tracing::warn!(error = %err, "mdns daemon failed to start");
            return Vec::new();
        }
    };
    let receiver = match daemon.browse(SERVICE_TYPE) {
        Ok(receiver) => receiver,
        Err(err) => {
            tracing::warn!(error = %err, "mdns browse failed");
            return Vec::new();
        }
    };

    let mut devices: HashMap<String, DeviceInfo> = HashMap::new();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        let event = match tokio::time::timeout(remaining, recv(&receiver)).await {
            Ok(Some(event)) => event,
            Ok(None) | Err(_) => break,
        };
        match event {
            ServiceEvent::ServiceResolved(info) => {
                let Some(ip) = first_ipv4(&info) else {
                    continue;
                };
                let port = info.get_port();
                let friendly_name = property(&info, "fn").unwrap_or_else(|| info.get_fullname().to_owned());
                let model = property(&info, "md").unwrap_or_else(|| "Chromecast".to_owned());
                let device = DeviceInfo::new(ip, port, friendly_name, model);
                match devices.get_mut(&device.id) {
                    Some(existing) => existing.available = true,
                    None => {
                        tracing::info!(id = %device.id, name = %device.friendly_name, "discovered cast device");
                        devices.insert(device.id.clone(), device);
                    }
                }
            }
            _ => continue,
        }
    }

    let _ = daemon.shutdown();
    devices.into_values().collect()
}

async fn recv(receiver: &mdns_sd::Receiver<ServiceEvent>) -> Option<ServiceEvent> {
    receiver.recv_async().await.ok()
}

fn property(info: &mdns_sd::ResolvedService, key: &str) -> Option<String> {
    info.get_property(key).map(|p| p.val_str().to_owned())
}

fn first_ipv4(info: &mdns_sd::ResolvedService) -> Option<Ipv4Addr> {
    info.get_addresses().iter().find_map(|ip| match ip {
        mdns_sd::ScopedIp::V4(v4) => Some(*v4.addr()),
        _ => None,
    })
}
