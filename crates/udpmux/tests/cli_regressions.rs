#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader, Read};
use std::net::UdpSocket;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use udpmux_value::{decode, encode, Value};

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(Some(status)) = child.try_wait() {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    let _ = child.kill();
    None
}

/// Reads the `listening on udp port N` line the listen command prints.
fn read_listen_port(stderr: impl Read) -> u16 {
    let reader = BufReader::new(stderr);
    for line in reader.lines() {
        let line = line.expect("stderr should be readable");
        if let Some(rest) = line.strip_prefix("listening on udp port ") {
            return rest.trim().parse().expect("port should be numeric");
        }
    }
    panic!("listen command never reported its port");
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_udpmux"))
        .arg("version")
        .output()
        .expect("version command should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("udpmux {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn listen_prints_received_value_as_json() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_udpmux"))
        .args([
            "--log-level",
            "error",
            "--format",
            "json",
            "listen",
            "0",
            "--channels",
            "0,1",
            "--count",
            "1",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("listen command should start");

    let port = read_listen_port(child.stderr.take().expect("stderr should be piped"));

    let value = Value::Array(vec![Value::Bool(true), Value::UInt32(5)]);
    let wire = encode(&value, 1024).expect("value should encode");
    let sender = UdpSocket::bind("127.0.0.1:0").expect("sender should bind");
    sender
        .send_to(&wire, ("127.0.0.1", port))
        .expect("send should succeed");

    let status = wait_with_timeout(&mut child, Duration::from_secs(5))
        .expect("listen should exit after one value");
    assert!(status.success());

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .expect("stdout should be piped")
        .read_to_string(&mut stdout)
        .expect("stdout should be readable");

    // One JSON line per attached channel the value fanned into.
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let parsed: serde_json::Value =
        serde_json::from_str(lines[0]).expect("output should be JSON");
    assert_eq!(parsed["type"], "array");
    assert_eq!(parsed["value"], serde_json::json!([true, 5]));
}

#[test]
fn send_delivers_an_encoded_string() {
    let receiver = UdpSocket::bind("127.0.0.1:0").expect("receiver should bind");
    receiver
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("timeout should apply");
    let dest = receiver.local_addr().expect("receiver addr");

    let output = Command::new(env!("CARGO_BIN_EXE_udpmux"))
        .args([
            "--log-level",
            "error",
            "send",
            &dest.to_string(),
            "--channel",
            "2",
            "--data",
            "hi",
        ])
        .output()
        .expect("send command should run");
    assert!(
        output.status.success(),
        "send failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let mut buf = [0u8; 1024];
    let (len, _) = receiver
        .recv_from(&mut buf)
        .expect("datagram should arrive");
    assert_eq!(
        decode(&buf[..len]).expect("payload should decode"),
        Value::String("hi".to_string())
    );
}

#[test]
fn send_rejects_invalid_destination() {
    let output = Command::new(env!("CARGO_BIN_EXE_udpmux"))
        .args(["send", "not-an-address", "--data", "x"])
        .output()
        .expect("send command should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn send_requires_a_payload() {
    let output = Command::new(env!("CARGO_BIN_EXE_udpmux"))
        .args(["send", "127.0.0.1:50000"])
        .output()
        .expect("send command should run");

    assert_eq!(output.status.code(), Some(64));
}
