use std::collections::{HashMap, HashSet, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, warn};
use udpmux_transport::{TransportError, UdpEndpoint};
use udpmux_value::{encode, Value};

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::rx;

/// The channel producers and consumers get when they don't pick one.
pub const DEFAULT_CHANNEL: u32 = 0;

/// State shared between the router and its receive loops.
pub(crate) struct Shared {
    /// The three routing tables, under one lock. The lock is held only across
    /// in-memory table access, never across a network send or receive.
    tables: Mutex<Tables>,
    /// Cleared exactly once by `close`; observed by every receive loop at its
    /// timeout cadence.
    pub(crate) running: AtomicBool,
}

impl Shared {
    pub(crate) fn lock_tables(&self) -> MutexGuard<'_, Tables> {
        // A loop that panicked mid-delivery leaves the tables structurally
        // intact, so poisoning is recoverable.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Default)]
pub(crate) struct Tables {
    /// Which logical channels a port's inbound traffic fans into. A port
    /// appears at most once; the entry itself is never removed.
    pub(crate) rx_channels: HashMap<u16, HashSet<u32>>,
    /// Decoded values waiting to be consumed, per channel. Created lazily on
    /// first delivery, unbounded, kept for the router's lifetime.
    pub(crate) rx_buffers: HashMap<u32, VecDeque<Value>>,
    /// Destinations a channel's outbound writes fan out to.
    pub(crate) tx_addresses: HashMap<u32, HashSet<SocketAddr>>,
}

/// Logical-channel multiplexer over UDP.
///
/// Channels are bare integers decoupled from physical port numbers: inbound
/// traffic on an attached port fans into every channel registered for that
/// port, and an outbound `write` fans out to every destination registered for
/// its channel. One receive-loop thread runs per attached port.
///
/// All routing-table operations are safe to call from any thread.
pub struct Router {
    shared: Arc<Shared>,
    /// Shared ephemeral send socket, one per router.
    tx: UdpEndpoint,
    config: RouterConfig,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Router {
    /// Create a router with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(RouterConfig::default())
    }

    /// Create a router with explicit configuration.
    pub fn with_config(config: RouterConfig) -> Result<Self> {
        let tx = UdpEndpoint::unbound()?;
        Ok(Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                running: AtomicBool::new(true),
            }),
            tx,
            config,
            handles: Mutex::new(Vec::new()),
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Attach a receive channel to a UDP port.
    ///
    /// The port's first ever attach binds the socket and spawns its receive
    /// loop; a bind failure surfaces here and leaves the tables untouched.
    /// Re-attaching an already-present (port, channel) pair is a no-op.
    ///
    /// Pass port 0 to let the OS pick a free port. Returns the port actually
    /// bound, which for nonzero input is the input itself.
    pub fn rx_attach(&self, port: u16, channel: u32) -> Result<u16> {
        let mut tables = self.shared.lock_tables();

        if port != 0 {
            if let Some(channels) = tables.rx_channels.get_mut(&port) {
                channels.insert(channel);
                return Ok(port);
            }
        }

        let endpoint = UdpEndpoint::bind(port)?;
        endpoint.set_read_timeout(self.config.recv_timeout)?;
        let bound = endpoint.local_port();

        let shared = Arc::clone(&self.shared);
        let max_packet = self.config.max_packet_size;
        let handle = std::thread::Builder::new()
            .name(format!("udpmux-rx-{bound}"))
            .spawn(move || rx::recv_loop(endpoint, bound, shared, max_packet))
            .map_err(TransportError::Io)?;

        tables.rx_channels.insert(bound, HashSet::from([channel]));
        drop(tables);

        self.lock_handles().push(handle);
        debug!(port = bound, channel, "rx channel attached, loop spawned");
        Ok(bound)
    }

    /// Detach a receive channel from a port.
    ///
    /// No-op if the pair was never attached. The port stays bound and its
    /// loop keeps running; an empty channel set just means nothing is
    /// delivered.
    pub fn rx_detach(&self, port: u16, channel: u32) {
        let mut tables = self.shared.lock_tables();
        if let Some(channels) = tables.rx_channels.get_mut(&port) {
            channels.remove(&channel);
        }
    }

    /// Number of values queued on a channel. 0 for channels never delivered to.
    pub fn available(&self, channel: u32) -> usize {
        self.shared
            .lock_tables()
            .rx_buffers
            .get(&channel)
            .map_or(0, VecDeque::len)
    }

    /// Pop the oldest queued value on a channel, or `None` if empty.
    pub fn read(&self, channel: u32) -> Option<Value> {
        self.shared
            .lock_tables()
            .rx_buffers
            .get_mut(&channel)
            .and_then(VecDeque::pop_front)
    }

    /// Encode a value once and send an independent datagram copy to every
    /// destination registered for `channel`.
    ///
    /// A channel with no destinations silently drops the write. Encode
    /// overflow surfaces before any network action. A failing destination
    /// never prevents attempting the rest; all failures are collected into
    /// [`RouterError::Send`].
    pub fn write(&self, value: &Value, channel: u32) -> Result<()> {
        let destinations: Vec<SocketAddr> = {
            let tables = self.shared.lock_tables();
            match tables.tx_addresses.get(&channel) {
                Some(addrs) => addrs.iter().copied().collect(),
                None => return Ok(()),
            }
        };
        if destinations.is_empty() {
            return Ok(());
        }

        let wire = encode(value, self.config.max_packet_size)?;

        let mut failed = Vec::new();
        for addr in &destinations {
            if let Err(err) = self.tx.send_to(&wire, *addr) {
                warn!(%addr, channel, error = %err, "send failed");
                failed.push((*addr, err));
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(RouterError::Send {
                attempted: destinations.len(),
                failed,
            })
        }
    }

    /// Register a destination address for a send channel.
    ///
    /// Set semantics: duplicate attach is a no-op.
    pub fn tx_attach(&self, addr: SocketAddr, channel: u32) {
        self.shared
            .lock_tables()
            .tx_addresses
            .entry(channel)
            .or_default()
            .insert(addr);
    }

    /// Register a destination by host and port.
    pub fn tx_attach_host(&self, host: IpAddr, port: u16, channel: u32) {
        self.tx_attach(SocketAddr::new(host, port), channel);
    }

    /// Stop all receive loops.
    ///
    /// One-shot: concurrent or repeated calls after the first do nothing.
    /// Fire-and-forget — loops observe the flag at their own timeout cadence;
    /// use [`join`](Self::join) for a synchronous guarantee.
    pub fn close(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            debug!("router closed");
        }
    }

    /// Close the router and block until every receive loop has exited.
    pub fn join(&self) {
        self.close();
        let handles = std::mem::take(&mut *self.lock_handles());
        for handle in handles {
            if handle.join().is_err() {
                warn!("receive loop panicked");
            }
        }
    }

    fn lock_handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("tx", &self.tx.local_addr())
            .field("running", &self.shared.running.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::{Duration, Instant};

    use udpmux_transport::UdpEndpoint;
    use udpmux_value::decode;

    use super::*;

    fn test_router() -> Router {
        Router::with_config(RouterConfig {
            recv_timeout: Duration::from_millis(50),
            ..RouterConfig::default()
        })
        .expect("router should construct")
    }

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    fn send_raw(bytes: &[u8], port: u16) {
        let tx = UdpEndpoint::unbound().expect("sender socket should bind");
        tx.send_to(bytes, loopback(port)).expect("send should succeed");
    }

    fn send_value(value: &Value, port: u16) {
        let wire = encode(value, 1024).expect("value should encode");
        send_raw(&wire, port);
    }

    fn wait_available(router: &Router, channel: u32, count: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if router.available(channel) >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn attach_read_scenario() {
        let router = test_router();
        let port = router.rx_attach(0, DEFAULT_CHANNEL).unwrap();

        let value = Value::Array(vec![Value::Bool(true), Value::UInt32(5)]);
        send_value(&value, port);

        assert!(wait_available(&router, 0, 1), "value should arrive");
        assert_eq!(router.available(0), 1);
        assert_eq!(router.read(0), Some(value));
        assert_eq!(router.read(0), None);
        assert_eq!(router.available(0), 0);
    }

    #[test]
    fn inbound_fanout_to_all_attached_channels() {
        let router = test_router();
        let p = router.rx_attach(0, 1).unwrap();
        assert_eq!(router.rx_attach(p, 2).unwrap(), p);
        let _q = router.rx_attach(0, 1).unwrap();

        send_value(&Value::String("fan".to_string()), p);

        assert!(wait_available(&router, 1, 1));
        assert!(wait_available(&router, 2, 1));
        assert_eq!(router.available(1), 1);
        assert_eq!(router.available(2), 1);
        assert_eq!(router.available(3), 0);
    }

    #[test]
    fn fifo_order_per_channel() {
        let router = test_router();
        let port = router.rx_attach(0, 4).unwrap();

        let tx = UdpEndpoint::unbound().unwrap();
        for text in ["A", "B"] {
            let wire = encode(&Value::String(text.to_string()), 1024).unwrap();
            tx.send_to(&wire, loopback(port)).unwrap();
        }

        assert!(wait_available(&router, 4, 2));
        assert_eq!(router.read(4), Some(Value::String("A".to_string())));
        assert_eq!(router.read(4), Some(Value::String("B".to_string())));
    }

    #[test]
    fn broadcast_sends_identical_copies() {
        let a = UdpEndpoint::bind(0).unwrap();
        let b = UdpEndpoint::bind(0).unwrap();
        a.set_read_timeout(Duration::from_secs(3)).unwrap();
        b.set_read_timeout(Duration::from_secs(3)).unwrap();

        let router = test_router();
        router.tx_attach(loopback(a.local_port()), DEFAULT_CHANNEL);
        router.tx_attach(loopback(b.local_port()), DEFAULT_CHANNEL);
        // Duplicate attach is a no-op.
        router.tx_attach(loopback(a.local_port()), DEFAULT_CHANNEL);

        let value = Value::String("broadcast".to_string());
        router.write(&value, DEFAULT_CHANNEL).unwrap();

        let mut buf_a = [0u8; 1024];
        let mut buf_b = [0u8; 1024];
        let (len_a, _) = a.recv_from_timeout(&mut buf_a).unwrap().expect("copy to a");
        let (len_b, _) = b.recv_from_timeout(&mut buf_b).unwrap().expect("copy to b");

        assert_eq!(&buf_a[..len_a], &buf_b[..len_b]);
        assert_eq!(decode(&buf_a[..len_a]).unwrap(), value);

        // Exactly one copy each.
        a.set_read_timeout(Duration::from_millis(50)).unwrap();
        assert!(a.recv_from_timeout(&mut buf_a).unwrap().is_none());
    }

    #[test]
    fn write_without_destinations_is_a_silent_no_op() {
        let router = test_router();
        router
            .write(&Value::String("hi".to_string()), 7)
            .expect("write with no destinations should not error");
    }

    #[test]
    fn write_overflow_surfaces_before_sending() {
        let rx = UdpEndpoint::bind(0).unwrap();
        rx.set_read_timeout(Duration::from_millis(100)).unwrap();

        let router = test_router();
        router.tx_attach(loopback(rx.local_port()), 9);

        let oversized = Value::String("z".repeat(2000));
        let err = router.write(&oversized, 9).unwrap_err();
        assert!(matches!(err, RouterError::Codec(_)));

        let mut buf = [0u8; 64];
        assert!(
            rx.recv_from_timeout(&mut buf).unwrap().is_none(),
            "nothing must be sent on overflow"
        );
    }

    #[test]
    fn detach_is_idempotent_and_never_errors() {
        let router = test_router();
        router.rx_detach(9999, 5);

        let port = router.rx_attach(0, 1).unwrap();
        router.rx_attach(port, 2).unwrap();
        router.rx_detach(port, 1);
        router.rx_detach(port, 1);

        send_value(&Value::Null, port);
        assert!(wait_available(&router, 2, 1));
        assert_eq!(router.available(1), 0, "detached channel gets nothing");
    }

    #[test]
    fn reattach_same_pair_is_a_no_op() {
        let router = test_router();
        let port = router.rx_attach(0, 3).unwrap();
        assert_eq!(router.rx_attach(port, 3).unwrap(), port);

        send_value(&Value::Bool(false), port);
        assert!(wait_available(&router, 3, 1));
        assert_eq!(router.available(3), 1, "one delivery, not two");
    }

    #[test]
    fn malformed_datagrams_are_dropped() {
        let router = test_router();
        let port = router.rx_attach(0, 6).unwrap();

        send_raw(&[0xFF, 1, 2, 3], port);
        send_raw(&[], port);
        // A valid value after garbage still gets through.
        send_value(&Value::Int32(-7), port);

        assert!(wait_available(&router, 6, 1));
        assert_eq!(router.available(6), 1);
        assert_eq!(router.read(6), Some(Value::Int32(-7)));
    }

    #[test]
    fn trailing_bytes_on_the_wire_are_malformed() {
        let router = test_router();
        let port = router.rx_attach(0, 8).unwrap();

        let mut wire = encode(&Value::Bool(true), 1024).unwrap().to_vec();
        wire.push(0);
        send_raw(&wire, port);
        send_value(&Value::Bool(true), port);

        assert!(wait_available(&router, 8, 1));
        assert_eq!(router.available(8), 1, "padded datagram must be dropped");
    }

    #[test]
    fn bind_failure_surfaces_and_leaves_tables_untouched() {
        let taken = UdpEndpoint::bind(0).unwrap();
        let router = test_router();

        let err = router.rx_attach(taken.local_port(), 1).unwrap_err();
        assert!(matches!(err, RouterError::Transport(_)));
        assert_eq!(router.available(1), 0);

        // The failed port can still be attached once it frees up.
        let port = taken.local_port();
        drop(taken);
        router.rx_attach(port, 1).unwrap();
    }

    #[test]
    fn close_stops_loops_and_join_returns() {
        let router = test_router();
        let port = router.rx_attach(0, 0).unwrap();

        router.close();
        router.close(); // one-shot: second call is a no-op
        router.join();

        // Loops are gone; late traffic is never delivered.
        send_value(&Value::Null, port);
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(router.available(0), 0);
    }

    #[test]
    fn loopback_write_to_own_port() {
        let router = test_router();
        let port = router.rx_attach(0, 2).unwrap();
        router.tx_attach(loopback(port), 2);

        router.write(&Value::UInt64(42), 2).unwrap();

        assert!(wait_available(&router, 2, 1));
        assert_eq!(router.read(2), Some(Value::UInt64(42)));
    }

    #[test]
    fn concurrent_readers_and_writers_share_the_tables() {
        let router = Arc::new(test_router());
        let port = router.rx_attach(0, 1).unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let router = Arc::clone(&router);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let _ = router.available(1);
                        let _ = router.read(1);
                    }
                })
            })
            .collect();

        for i in 0..10u32 {
            send_value(&Value::UInt32(i), port);
        }

        for worker in workers {
            worker.join().unwrap();
        }
    }
}
