//! RecordingSink: collects emitted packets for assertions.

use crate::component::{Component, IpHandler};
use crate::error::PortError;
use crate::ip::Ip;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Records every packet it is handed, in arrival order.
#[derive(Clone, Default)]
pub struct RecordingSink {
    packets: Arc<Mutex<Vec<Ip>>>,
    arrived: Arc<Notify>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records into this sink.
    pub fn handler(&self) -> IpHandler {
        let sink = self.clone();
        Arc::new(move |ip: &Ip| sink.record(ip.clone()))
    }

    /// Subscribe this sink to an out-port of `component`.
    pub fn listen(&self, component: &dyn Component, port: &str) -> Result<(), PortError> {
        component.on_ip(port, self.handler())
    }

    /// Record a packet.
    pub fn record(&self, ip: Ip) {
        self.packets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ip);
        self.arrived.notify_waiters();
    }

    /// Snapshot of the recorded packets.
    pub fn packets(&self) -> Vec<Ip> {
        self.packets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded packets rendered with `Display`, e.g. `data Hello Foo`.
    pub fn rendered(&self) -> Vec<String> {
        self.packets().iter().map(ToString::to_string).collect()
    }

    /// Number of recorded packets.
    pub fn len(&self) -> usize {
        self.packets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` packets were recorded and return them.
    pub async fn wait_for(&self, count: usize) -> Vec<Ip> {
        loop {
            let arrived = self.arrived.notified();
            tokio::pin!(arrived);
            arrived.as_mut().enable();
            if self.len() >= count {
                return self.packets();
            }
            arrived.await;
        }
    }
}
