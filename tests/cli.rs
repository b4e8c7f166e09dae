use std::fs;
use std::io::Write;
use std::process::Stdio;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const GOOD: &str = r#"
groups = ["1", "2"]
layouts = [{ kind = "columns", border_width = 0 }, { kind = "max" }]

[[keys]]
trigger = "Super + Tab"
action = "next_layout"
"#;

const DUPLICATE: &str = r#"
[[keys]]
trigger = "Super + Tab"
action = "next_layout"

[[keys]]
trigger = "mod4 + tab"
action = "kill"
"#;

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lattice.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn validate_accepts_a_good_config() {
    let (_dir, path) = write_config(GOOD);
    let output = test_bin::get_test_bin("lattice")
        .arg("--config")
        .arg(&path)
        .arg("--validate")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ok"));
}

#[test]
fn validate_rejects_duplicate_bindings() {
    let (_dir, path) = write_config(DUPLICATE);
    let output = test_bin::get_test_bin("lattice")
        .arg("--config")
        .arg(&path)
        .arg("--validate")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate binding"));
}

#[test]
fn validate_fails_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = test_bin::get_test_bin("lattice")
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("--validate")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn speaks_json_lines_until_input_closes() {
    let (_dir, path) = write_config(GOOD);
    let mut child = test_bin::get_test_bin("lattice")
        .arg("--config")
        .arg(&path)
        .arg("--no-watch")
        .arg("--screen")
        .arg("1200x800")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let events = [
        json!({"event": "window_mapped", "id": 1, "info": {"class": "term"}}),
        json!({"event": "window_mapped", "id": 2, "info": {"class": "term"}}),
        json!({"event": "key_pressed", "trigger": "Super + Tab"}),
    ];
    {
        let mut stdin = child.stdin.take().unwrap();
        for event in &events {
            writeln!(stdin, "{event}").unwrap();
        }
    }
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let configures: Vec<&Value> =
        lines.iter().filter(|l| l["request"] == "configure").collect();
    assert!(configures.contains(&&json!({
        "request": "configure",
        "window": 1,
        "frame": {"x": 0, "y": 0, "width": 600, "height": 800},
        "border": 0,
    })));
    // Max layout after the key press: window 2 fills the screen.
    assert_eq!(
        configures.last().map(|c| c["frame"].clone()),
        Some(json!({"x": 0, "y": 0, "width": 1200, "height": 800}))
    );
    assert!(lines.iter().any(|l| l["event"] == "layout_changed" && l["layout"] == "max"));
    let requests: Vec<&Value> = lines.iter().filter(|l| l.get("request").is_some()).collect();
    assert_eq!(requests.last(), Some(&&json!({"request": "shutdown"})));
}
