use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

const CONFIG: &str = include_str!("../../../crates/redux-document/tests/fixtures/config.json5");

struct Workspace {
    dir: tempfile::TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tmp");
        let config = dir.path().join("config.json5");
        std::fs::write(&config, CONFIG).expect("write fixture");
        Self { dir, config }
    }

    fn settings(&self) -> PathBuf {
        self.dir.path().join("settings.json")
    }

    fn editor(&self) -> Command {
        let mut cmd = Command::cargo_bin("redux-editor").expect("binary built");
        cmd.env("REDUX_SETTINGS", self.settings())
            .env("REDUX_CONFIG_PATH", &self.config)
            .env_remove("REDUXD_SOCKET")
            .env_remove("RUST_LOG");
        cmd
    }

    fn text(&self) -> String {
        read(&self.config)
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read")
}

#[test]
fn list_shows_every_section() {
    let ws = Workspace::new();
    ws.editor()
        .args(["--local", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[hideoutOptions] Hideout Options"))
        .stdout(predicate::str::contains("[otherTweaks] Other Tweaks"))
        .stdout(predicate::str::contains("fasterBitcoinFarming.bitcoinPrice = 100000\n"));
}

#[test]
fn edits_and_save_keep_comments() {
    let ws = Workspace::new();
    ws.editor()
        .args([
            "--local",
            "--set",
            "hideoutOptions.fasterBitcoinFarming.bitcoinPrice=",
            "--set",
            "otherTweaks.questChanges=false",
            "--save",
            "--list",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"))
        .stdout(predicate::str::contains("fasterBitcoinFarming.bitcoinPrice = null *"))
        .stdout(predicate::str::contains("questChanges = false *"));

    let expected = CONFIG
        .replace("\"bitcoinPrice\": 100000", "\"bitcoinPrice\": null")
        .replace("\"questChanges\": true", "\"questChanges\": false");
    assert_eq!(ws.text(), expected);
}

#[test]
fn rejected_input_fails_without_writing() {
    let ws = Workspace::new();
    ws.editor()
        .args(["--local", "--set", "stashOptions.currencyRequirementMultiplier=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be negative"));

    ws.editor()
        .args(["--local", "--set", "stashOptions.missing.value=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert_eq!(ws.text(), CONFIG);
}

#[test]
fn reset_section_restores_loaded_values() {
    let ws = Workspace::new();
    ws.editor()
        .args([
            "--local",
            "--set",
            "otherTweaks.currencyStackSizes.roubles=5",
            "--reset-section",
            "otherTweaks",
            "--save",
        ])
        .assert()
        .success();
    assert_eq!(ws.text(), CONFIG);
}

#[test]
fn wait_autosave_saves_after_the_delay() {
    let ws = Workspace::new();
    std::fs::write(ws.settings(), r#"{ "editor": { "autosave_delay_ms": 100 } }"#).expect("settings");

    let mut child = ws
        .editor()
        .args(["--local", "--set", "economyOptions.enabled=off", "--wait-autosave"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn editor");
    match child.wait_timeout(Duration::from_secs(20)).expect("wait_timeout") {
        Some(status) => assert!(status.success(), "editor exited with {:?}", status),
        None => {
            let _ = child.kill();
            panic!("editor did not exit within timeout");
        }
    }

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .expect("piped stdout")
        .read_to_string(&mut stdout)
        .expect("read stdout");
    assert!(stdout.contains("Autosaved"), "stdout: {}", stdout);

    let text = ws.text();
    assert!(text.contains("// Price of bitcoin in the handbook."));
    assert!(text.contains("\"economyOptions\": {\n    \"enabled\": false,"));
}

#[test]
fn init_settings_writes_defaults() {
    let ws = Workspace::new();
    ws.editor()
        .arg("--init-settings")
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings written to"));
    let written = read(&ws.settings());
    assert!(written.contains("\"autosave_delay_ms\": 5000"));
}

#[test]
fn missing_document_is_reported() {
    let ws = Workspace::new();
    ws.editor()
        .args(["--local", "--open"])
        .arg(ws.dir.path().join("absent.json5"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot resolve"));
}
