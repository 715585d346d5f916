//! Integration tests for the `gsnip` binary entry point.
//!
//! Verifies help output, usage failures and a full exchange with a scripted
//! UDP daemon.

use std::net::UdpSocket;
use std::thread;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn help_lists_commands() {
    let mut command = cargo_bin_cmd!("gsnip");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("find"))
        .stdout(contains("reload"));
}

#[test]
fn missing_name_exits_with_failure() {
    let mut command = cargo_bin_cmd!("gsnip");
    command.arg("find");
    command.assert().failure().stderr(contains("<NAME>"));
}

#[test]
fn find_prints_reply_body() {
    let daemon = UdpSocket::bind(("127.0.0.1", 0)).expect("bind scripted daemon");
    let addr = daemon.local_addr().expect("local addr");
    let worker = thread::spawn(move || {
        let mut buffer = [0_u8; 1024];
        let (size, peer) = daemon.recv_from(&mut buffer).expect("receive request");
        daemon.send_to(b"print(\"hi\")", peer).expect("send reply");
        buffer[..size].to_vec()
    });

    let mut command = cargo_bin_cmd!("gsnip");
    let endpoint = format!("udp://{addr}");
    command.args(["--daemon-socket", endpoint.as_str(), "find", "hello"]);
    command.assert().success().stdout("print(\"hi\")\n");
    assert_eq!(worker.join().expect("join daemon"), b"@FND hello");
}

#[test]
fn daemon_error_marker_exits_with_failure() {
    let daemon = UdpSocket::bind(("127.0.0.1", 0)).expect("bind scripted daemon");
    let addr = daemon.local_addr().expect("local addr");
    let worker = thread::spawn(move || {
        let mut buffer = [0_u8; 1024];
        let (_, peer) = daemon.recv_from(&mut buffer).expect("receive request");
        daemon.send_to(b"ERROR", peer).expect("send reply");
    });

    let mut command = cargo_bin_cmd!("gsnip");
    command.env("GSNIP_DAEMON_SOCKET", format!("udp://{addr}"));
    command.args(["delete", "x"]);
    command
        .assert()
        .code(1)
        .stderr(contains("daemon reported an error for delete"));
    worker.join().expect("join daemon");
}
