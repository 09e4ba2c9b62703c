use async_trait::async_trait;

use super::{Monitor, RefreshContext};
use crate::collector::{ReadFailure, SystemReader};
use crate::rates::RateState;
use crate::settings::Settings;
use crate::vitals::state::{NetSample, Property, Value};

/// Interface name prefixes for bridges and virtual devices.
const VIRTUAL_PREFIXES: &[&str] = &["br-", "docker", "veth", "virbr", "vnet"];

/// Returns true for interfaces whose traffic counts towards the total.
pub fn is_physical_interface(name: &str) -> bool {
    name != "lo" && !VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Receive and transmit throughput from `/proc/net/dev`.
pub struct NetworkMonitor {
    reader: SystemReader,
    recv: RateState,
    sent: RateState,
    /// Interface restriction the trackers were filled under.
    device: Option<String>,
}

impl NetworkMonitor {
    pub fn new(reader: SystemReader) -> Self {
        Self {
            reader,
            recv: RateState::new(0),
            sent: RateState::new(0),
            device: None,
        }
    }
}

#[async_trait]
impl Monitor for NetworkMonitor {
    fn name(&self) -> &'static str {
        "network"
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.show_net
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let devices = self.reader.read_net_dev().await?;

        if self.device != ctx.settings.network_device {
            tracing::debug!(device = ?ctx.settings.network_device, "network device changed");
            self.destroy();
            self.device = ctx.settings.network_device.clone();
        }

        let (rx, tx) = devices
            .iter()
            .filter(|d| match &self.device {
                Some(device) => d.interface == *device,
                None => is_physical_interface(&d.interface),
            })
            .fold((0u64, 0u64), |(rx, tx), d| {
                (rx.saturating_add(d.rx_bytes), tx.saturating_add(d.tx_bytes))
            });

        self.recv.update(rx, ctx.now);
        self.sent.update(tx, ctx.now);
        // A negative rate means an interface went away or was reset.
        let sample = NetSample {
            recv: self.recv.rate().max(0.0),
            sent: self.sent.rate().max(0.0),
        };

        ctx.publish(|state| {
            state.set(Property::NetRecv, Value::Float(sample.recv));
            state.set(Property::NetSent, Value::Float(sample.sent));
            state.net_history.push(sample);
            state.set(
                Property::NetHistory,
                Value::Fingerprint(state.net_history.fingerprint()),
            );
        });
        Ok(())
    }

    fn destroy(&mut self) {
        self.recv.reset();
        self.sent.reset();
    }
}
