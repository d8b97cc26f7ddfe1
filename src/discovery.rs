//! mDNS discovery (C10, §6): browse `_http._tcp.local.`, filter by the
//! `PI monitor:` instance-name prefix.

use crate::error::ControlError;
use crate::models::DiscoveredDeviceInfo;
use std::time::Duration;

const SERVICE_TYPE: &str = "_http._tcp.local.";
const VALID_PREFIX: &str = "PI monitor:";

pub fn is_valid_service_name(name: &str) -> bool {
    name.starts_with(VALID_PREFIX)
}

/// Browse for devices for `duration`, returning every distinct
/// `(server, port)` discovered, deduplicated for the lifetime of the
/// browse.
pub async fn discover_devices(duration: Duration) -> Result<Vec<DiscoveredDeviceInfo>, ControlError> {
    let daemon = mdns_sd::ServiceDaemon::new()
        .map_err(|e| ControlError::Device { status: 0, message: e.to_string() })?;
    let receiver = daemon
        .browse(SERVICE_TYPE)
        .map_err(|e| ControlError::Device { status: 0, message: e.to_string() })?;

    let mut devices = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let deadline = tokio::time::Instant::now() + duration;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        let event = match tokio::time::timeout(remaining, async {
            tokio::task::spawn_blocking({
                let receiver = receiver.clone();
                move || receiver.recv_timeout(Duration::from_millis(200))
            })
            .await
        })
        .await
        {
            Ok(Ok(Ok(event))) => event,
            _ => continue,
        };
        if let mdns_sd::ServiceEvent::ServiceResolved(info) = event {
            if !is_valid_service_name(info.get_fullname()) {
                continue;
            }
            let key = (info.get_hostname().to_string(), info.get_port());
            if seen.insert(key) {
                devices.push(DiscoveredDeviceInfo {
                    name: info.get_fullname().to_string(),
                    server: info.get_hostname().to_string(),
                    addresses: info.get_addresses().iter().map(|a| (*a).into()).collect(),
                    port: info.get_port(),
                });
            }
        }
    }
    let _ = daemon.shutdown();
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_prefix() {
        assert!(is_valid_service_name("PI monitor:abc123._http._tcp.local."));
    }

    #[test]
    fn rejects_other_services() {
        assert!(!is_valid_service_name("Some Printer._http._tcp.local."));
    }
}
