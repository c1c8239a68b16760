//! Loopback demo — four channels ping-ponging over real UDP sockets.
//!
//! Channel 0 carries a greeting string, channels 1 and 2 bounce a u32
//! counter back and forth, and channel 3 carries a status array of booleans.
//! Everything is sent to this process's own ports, so a single instance
//! talks to itself once per second.
//!
//! Run with:
//!   cargo run --example loopback

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

use udpmux::router::Router;
use udpmux::value::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let router = Router::new()?;

    for channel in 0..4u32 {
        let port = router.rx_attach(0, channel)?;
        let dest = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
        router.tx_attach(dest, channel);
        eprintln!("channel {channel} <-> udp port {port}");
    }

    loop {
        let pending = [
            router.available(0) > 0,
            router.available(1) > 0,
            router.available(2) > 0,
            router.available(3) > 0,
        ];

        if pending[0] {
            if let Some(value) = router.read(0) {
                println!("received (ch0): {:?}", value.as_str());
            }
        }
        router.write(&Value::from("Hello. I'm udpmux."), 0)?;
        println!("sent (ch0): \"Hello. I'm udpmux.\"");

        let counter = match router.read(1) {
            Some(value) => {
                let v = value.as_u64().unwrap_or(0) as u32;
                println!("received (ch1): {v}");
                v + 1
            }
            None => 0,
        };
        router.write(&Value::UInt32(counter), 2)?;
        println!("sent (ch2): {counter}");

        let counter = match router.read(2) {
            Some(value) => {
                let v = value.as_u64().unwrap_or(0) as u32;
                println!("received (ch2): {v}");
                v + 1
            }
            None => 0,
        };
        router.write(&Value::UInt32(counter), 1)?;
        println!("sent (ch1): {counter}");

        if pending[3] {
            if let Some(value) = router.read(3) {
                println!("received (ch3): {:?}", value.as_array());
            }
        }
        let status: Vec<Value> = pending.iter().map(|b| Value::Bool(*b)).collect();
        router.write(&Value::Array(status), 3)?;
        println!("sent (ch3): {pending:?}");

        thread::sleep(Duration::from_secs(1));
    }
}
