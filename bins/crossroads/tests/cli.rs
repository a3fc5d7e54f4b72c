//! End-to-end tests for the `crossroads` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread;
use tempfile::TempDir;

const STREETS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature",
     "geometry": {"type": "Point", "coordinates": [-79.3800, 43.6500]},
     "properties": {"street1": "king st w", "street2": "bay st"}},
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[-79.3850, 43.6500], [-79.3800, 43.6500]]},
     "properties": {"name": "King St W", "class": "Major"}},
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[-79.3800, 43.6500], [-79.3750, 43.6500]]},
     "properties": {"name": "King St E", "class": "Major"}},
    {"type": "Feature",
     "geometry": {"type": "LineString", "coordinates": [[-79.3800, 43.6450], [-79.3800, 43.6500]]},
     "properties": {"name": "Bay St", "class": "Minor"}}
  ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("streets.geojson"), STREETS).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("crossroads").unwrap();
        cmd.current_dir(self.dir.path()).env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn test_distance_text() {
    Command::cargo_bin("crossroads")
        .unwrap()
        .args(["distance", "43.6532", "-79.3832", "45.5017", "-73.5673"])
        .assert()
        .success()
        .stdout(predicate::str::contains("km"));
}

#[test]
fn test_distance_rejects_bad_latitude() {
    Command::cargo_bin("crossroads")
        .unwrap()
        .args(["distance", "95.0", "0", "0", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E6004"));
}

#[test]
fn test_nearest_point_feature() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["nearest", "43.6501", "-79.3800", "-i", "streets.geojson"])
        .assert()
        .success()
        .stdout(predicate::str::contains("King St W & Bay St"));
}

#[test]
fn test_nearest_json_output() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args([
            "--format",
            "json",
            "nearest",
            "43.6501",
            "-79.3800",
            "-i",
            "streets.geojson",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // The point and the end of King St W are equidistant; the earlier feature wins.
    assert_eq!(value["resolution"]["name"], "King St W & Bay St");
    assert_eq!(value["resolution"]["source"], "feature");
    assert_eq!(value["resolution"]["index"], 0);
}

#[test]
fn test_nearest_out_of_range() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["nearest", "43.70", "-79.38", "-i", "streets.geojson", "--radius", "50"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No intersection within 50.0 m"));
}

/// Answer a single HTTP request with a canned `jsonv2` body; returns the base URL.
fn serve_reverse_geocoder(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
    });

    base_url
}

#[test]
fn test_nearest_falls_back_to_reverse_geocoder() {
    let fx = Fixture::new();
    let base_url =
        serve_reverse_geocoder(r#"{"display_name": "Yonge Street, Midtown, Toronto"}"#);
    std::fs::write(
        fx.path(".crossroads.toml"),
        format!("[geocoder]\nenabled = true\nbase_url = \"{}\"\n", base_url),
    )
    .unwrap();

    fx.cmd()
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .args(["nearest", "43.70", "-79.38", "-i", "streets.geojson", "--radius", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No intersection within 50.0 m"))
        .stdout(predicate::str::contains("Yonge Street, Midtown, Toronto"))
        .stdout(predicate::str::contains("reverse geocoder"));
}

#[test]
fn test_nearest_missing_file() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["nearest", "43.65", "-79.38", "-i", "missing.geojson"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_graph_resolves_shared_endpoint() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["graph", "43.6501", "-79.3801", "-i", "streets.geojson"])
        .assert()
        .success()
        .stdout(predicate::str::contains("King St W & Bay St"));
}

#[test]
fn test_graph_list() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["graph", "--list", "-i", "streets.geojson"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 node"));
}

#[test]
fn test_batch_json() {
    let fx = Fixture::new();
    std::fs::write(
        fx.path("track.txt"),
        "# track\n43.6501,-79.3801\n43.7000,-79.3000\n",
    )
    .unwrap();

    let output = fx
        .cmd()
        .args([
            "--format",
            "json",
            "batch",
            "-i",
            "streets.geojson",
            "-p",
            "track.txt",
            "-r",
            "100",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = value.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0]["resolution"].is_object());
    assert!(results[1]["resolution"].is_null());
}

#[test]
fn test_batch_text_with_progress() {
    let fx = Fixture::new();
    std::fs::write(fx.path("track.txt"), "43.6501,-79.3801\n43.7000,-79.3000\n").unwrap();

    fx.cmd()
        .args(["batch", "-i", "streets.geojson", "-p", "track.txt", "-r", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("King St W"))
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn test_config_file_radius() {
    let fx = Fixture::new();
    std::fs::write(fx.path(".crossroads.toml"), "[resolver]\nradius_m = 5.0\n").unwrap();

    fx.cmd()
        .args(["nearest", "43.6510", "-79.3800", "-i", "streets.geojson"])
        .assert()
        .code(4);
}

#[test]
fn test_invalid_config_value() {
    let fx = Fixture::new();
    std::fs::write(fx.path(".crossroads.toml"), "[resolver]\nradius_m = -1.0\n").unwrap();

    fx.cmd()
        .args(["nearest", "43.65", "-79.38", "-i", "streets.geojson"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("resolver.radius_m"));
}
