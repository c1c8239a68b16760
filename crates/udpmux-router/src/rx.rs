use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, error, warn};
use udpmux_transport::UdpEndpoint;
use udpmux_value::{decode, Value};

use crate::router::Shared;

/// Receive loop body, one thread per attached port.
///
/// Runs until the router-wide running flag clears (observed at each receive
/// timeout) or the socket fails hard. Malformed datagrams are logged and
/// dropped; they never terminate the loop.
pub(crate) fn recv_loop(endpoint: UdpEndpoint, port: u16, shared: Arc<Shared>, max_packet: usize) {
    let mut buf = vec![0u8; max_packet];
    debug!(port, "receive loop started");

    while shared.running.load(Ordering::SeqCst) {
        match endpoint.recv_from_timeout(&mut buf) {
            Ok(Some((len, from))) => match decode(&buf[..len]) {
                Ok(value) => deliver(&shared, port, value),
                Err(err) => {
                    warn!(port, %from, len, error = %err, "dropping malformed datagram");
                }
            },
            // Timeout: re-check the running flag and retry.
            Ok(None) => {}
            Err(err) => {
                error!(port, error = %err, "receive failed, stopping loop");
                break;
            }
        }
    }

    debug!(port, "receive loop stopped");
}

/// Fan one decoded value into every channel FIFO attached to `port`.
fn deliver(shared: &Shared, port: u16, value: Value) {
    let mut tables = shared.lock_tables();
    let channels: Vec<u32> = match tables.rx_channels.get(&port) {
        Some(channels) => channels.iter().copied().collect(),
        None => return,
    };
    for channel in channels {
        tables
            .rx_buffers
            .entry(channel)
            .or_default()
            .push_back(value.clone());
    }
}
