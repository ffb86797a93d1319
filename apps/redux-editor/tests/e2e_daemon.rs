use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::sleep;

const CONFIG: &str = include_str!("../../../crates/redux-document/tests/fixtures/config.json5");

struct Daemon(Child);

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

async fn wait_port(addr: &str, timeout: Duration) -> bool {
    let started = Instant::now();
    while started.elapsed() < timeout {
        if TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn e2e_editor_patches_through_daemon() {
    let Ok(mut daemon_cmd) = Command::cargo_bin("reduxd") else {
        eprintln!("skipping e2e_editor_patches_through_daemon: reduxd is not built");
        return;
    };

    let dir = tempfile::tempdir().expect("tmp");
    let config = dir.path().join("config.json5");
    std::fs::write(&config, CONFIG).expect("write fixture");
    let settings = dir.path().join("settings.json");
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").to_string()
    };

    daemon_cmd
        .env("REDUX_SETTINGS", &settings)
        .env("REDUXD_SOCKET", &addr)
        .env("REDUX_CONFIG_PATH", &config)
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let _daemon = Daemon(daemon_cmd.spawn().expect("spawn reduxd"));
    assert!(wait_port(&addr, Duration::from_secs(10)).await, "daemon not ready");

    Command::cargo_bin("redux-editor")
        .expect("binary built")
        .env("REDUX_SETTINGS", &settings)
        .env("REDUXD_SOCKET", &addr)
        .env("REDUX_CONFIG_PATH", &config)
        .args(["--set", "traderChanges.pacifistFence.numberOfFenceOffers=12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened"));

    let text = std::fs::read_to_string(&config).expect("read");
    assert!(text.contains("\"numberOfFenceOffers\": 12"));
    assert!(text.contains("// Price of bitcoin in the handbook."));
}
