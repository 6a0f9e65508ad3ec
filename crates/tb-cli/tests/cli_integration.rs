//! CLI integration tests
//!
//! Tests the toxicblend CLI using assert_cmd.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use assert_cmd::Command;
use bytes::BytesMut;
use predicates::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

use tb_protocol::{Request, RequestCodec, ResponseCodec, ResponseItem};

fn toxicblend() -> Command {
    let mut cmd = Command::cargo_bin("toxicblend")
        .expect("Failed to locate toxicblend binary - ensure it's built before running tests");
    cmd.env_remove("TOXICBLEND_HOST").env_remove("TOXICBLEND_PORT");
    cmd
}

/// Answer one request by echoing its meshes back, and return the request
fn echo_server() -> (u16, thread::JoinHandle<Request>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let mut codec = RequestCodec::new();
        let mut buf = BytesMut::new();
        let request = loop {
            if let Some(request) = codec.decode(&mut buf).unwrap() {
                break request;
            }
            let mut chunk = [0u8; 4096];
            let n = socket.read(&mut chunk).unwrap();
            assert!(n > 0, "client hung up before sending a request");
            buf.extend_from_slice(&chunk[..n]);
        };

        let mut out = BytesMut::new();
        let mut responses = ResponseCodec::new();
        for mesh in &request.meshes {
            responses
                .encode(ResponseItem::Mesh(mesh.clone()), &mut out)
                .unwrap();
        }
        responses.encode(ResponseItem::End, &mut out).unwrap();
        socket.write_all(&out).unwrap();
        request
    });

    (port, handle)
}

const SQUARE: &str = "o Square\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";

#[test]
fn test_cli_help() {
    toxicblend()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("toxicblend"))
        .stdout(predicate::str::contains("geometry server"));
}

#[test]
fn test_cli_version() {
    toxicblend()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("toxicblend"));
}

#[test]
fn test_cli_median_axis_help() {
    toxicblend()
        .args(["median-axis", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--z-epsilon"))
        .stdout(predicate::str::contains("--plane"));
}

#[test]
fn test_cli_rejects_unknown_plane() {
    toxicblend()
        .args(["circle", "--plane", "diagonal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("projection plane"));
}

#[test]
fn test_config_init_and_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    toxicblend()
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    toxicblend()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("port = 9999"));

    toxicblend()
        .args(["config", "show", "--port", "7000", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 7000"));
}

#[test]
fn test_connection_refused_reports_server() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    toxicblend()
        .args(["circle", "--host", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("toxicblend server running"));
}

#[test]
fn test_median_axis_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("square.obj");
    std::fs::write(&input, SQUARE).unwrap();
    let out = dir.path().join("out");

    let (port, server) = echo_server();
    toxicblend()
        .args(["median-axis", "--plane", "xz", "--host", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .arg("--output-dir")
        .arg(&out)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("toxicblend_medianaxis.000"));

    let request = server.join().unwrap();
    assert_eq!(request.command, "object.toxicblend_medianaxis");
    assert_eq!(request.properties.get("projectionPlane"), Some("XZ_PLANE"));
    assert_eq!(request.mesh().map(|m| m.vertex_count()), Some(4));

    let written = std::fs::read_to_string(out.join("toxicblend_medianaxis-0.obj")).unwrap();
    assert!(written.contains("f 1 2 3"));
    assert!(written.contains("f 1 3 4"));
}

#[test]
fn test_send_raw_command() {
    let dir = tempfile::tempdir().unwrap();
    let (port, server) = echo_server();

    toxicblend()
        .args(["send", "object.custom", "-p", "alpha=1", "-p", "beta=two", "--port"])
        .arg(port.to_string())
        .args(["--host", "127.0.0.1", "--output-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no objects"));

    let request = server.join().unwrap();
    assert!(request.is_command_only());
    assert_eq!(request.properties.get("alpha"), Some("1"));
    assert_eq!(request.properties.get("beta"), Some("two"));
}
