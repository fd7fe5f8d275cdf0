use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use assert_cmd::prelude::*;
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use tempfile::TempDir;

const LOGIN_URL: &str = "https://app.test/login";

/// Isolated working directory with a page fixture and no user config.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        write_png(&ws.path().join("login.png"), [240, 240, 240, 255]);
        ws.write_fixture();
        ws
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write_fixture(&self) {
        let pages = json!({
            LOGIN_URL: {
                "title": "Login",
                "screenshot_file": "login.png",
                "elements": [
                    {"index": 0, "tag": "input", "id": "email", "input_type": "email", "name": "Email"},
                    {"index": 0, "tag": "input", "id": "password", "input_type": "password", "name": "Password"},
                    {"index": 0, "tag": "button", "test_id": "submit-button", "test_attribute": "data-testid", "text": "Sign in"}
                ]
            }
        });
        std::fs::write(self.path().join("pages.json"), pages.to_string()).unwrap();
    }

    fn command(&self) -> Command {
        let bin = assert_cmd::cargo::cargo_bin!("uitestgen");
        let mut cmd = Command::new(bin);
        cmd.current_dir(self.path())
            .env("RUST_LOG", "warn")
            .env_remove("UITESTGEN_OUTPUT_DIR")
            .env_remove("UITESTGEN_LLM_API_KEY")
            .args(["--config", "uitestgen.yaml", "--fixture", "pages.json"]);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.command().args(["--output", "json"]).args(args).output().unwrap();
        assert!(
            output.status.success(),
            "{args:?} failed:\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is one json document")
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(["--output", "json"]).args(args).output().unwrap()
    }
}

fn write_png(path: &Path, color: [u8; 4]) {
    let mut image = RgbaImage::from_pixel(32, 24, Rgba(color));
    for x in 4..12 {
        image.put_pixel(x, 6, Rgba([20, 20, 20, 255]));
    }
    image.save_with_format(path, ImageFormat::Png).unwrap();
}

#[test]
fn help_lists_commands() {
    let bin = assert_cmd::cargo::cargo_bin!("uitestgen");
    let assert = Command::new(bin).arg("--help").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for command in ["generate", "heal", "check", "baseline", "config"] {
        assert!(stdout.contains(command), "help is missing {command}:\n{stdout}");
    }
}

#[test]
fn config_show_redacts_environment_key() {
    let ws = Workspace::new();
    std::fs::write(ws.path().join("uitestgen.yaml"), "llm:\n  provider: openai\n").unwrap();

    let output = ws
        .command()
        .env("OPENAI_API_KEY", "sk-do-not-print")
        .args(["--output", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("sk-do-not-print"));

    let config: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["llm"]["provider"], "openai");
    assert_eq!(config["llm"]["api_key"], "***");
    assert_eq!(config["agent"]["max_steps"], 10);
}

#[test]
fn config_set_rejects_unknown_keys() {
    let ws = Workspace::new();
    ws.command()
        .args(["config", "set", "healing.cascade_candidates", "true"])
        .assert()
        .success();
    let saved = std::fs::read_to_string(ws.path().join("uitestgen.yaml")).unwrap();
    assert!(saved.contains("cascade_candidates: true"));

    ws.command()
        .args(["config", "set", "healing.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn generate_writes_three_files_offline() {
    let ws = Workspace::new();
    let outcome = ws.json(&[
        "generate",
        "cover the login form",
        "--feature",
        "login",
        "--team",
        "web",
        "--url",
        LOGIN_URL,
        "--output-dir",
        "out",
        "--offline",
    ]);

    let steps: Vec<&str> = outcome["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|step| step["action"].as_str().unwrap())
        .collect();
    assert_eq!(steps.len(), 5, "unexpected steps: {steps:?}");
    assert_eq!(steps.first(), Some(&"inspect"));

    let paths: Vec<PathBuf> = outcome["state"]["persisted_paths"]
        .as_array()
        .unwrap()
        .iter()
        .map(|path| ws.path().join(path.as_str().unwrap()))
        .collect();
    assert_eq!(paths.len(), 3);
    for path in &paths {
        assert!(path.exists(), "{} missing", path.display());
        assert!(path.starts_with(ws.path().join("out").join("web").join("login")));
    }
    let spec = std::fs::read_to_string(ws.path().join("out/web/login/tests/login.spec.ts")).unwrap();
    assert!(spec.contains("test("));
}

#[test]
fn heal_patches_the_source_file() {
    let ws = Workspace::new();
    let spec = "await page.locator(\"#login-submit\").click();\n";
    std::fs::write(ws.path().join("login.spec.ts"), spec).unwrap();

    let result = ws.json(&[
        "heal",
        "--url",
        LOGIN_URL,
        "--selector",
        "#login-submit",
        "--file",
        "login.spec.ts",
        "--offline",
    ]);

    assert_eq!(result["status"], "healed");
    assert_eq!(result["new_selector"], "[data-testid='submit-button']");
    let patched = std::fs::read_to_string(ws.path().join("login.spec.ts")).unwrap();
    assert!(patched.contains("[data-testid='submit-button']"));

    let again = ws.json(&[
        "heal",
        "--url",
        LOGIN_URL,
        "--selector",
        "#login-submit",
        "--file",
        "login.spec.ts",
        "--offline",
    ]);
    assert_eq!(again["status"], "nothing-to-fix");
}

#[test]
fn visual_check_bootstraps_detects_and_accepts() {
    let ws = Workspace::new();
    let check = ["check", "--url", LOGIN_URL, "--name", "login page", "--baseline-dir", "baselines"];

    let first = ws.json(&check);
    assert_eq!(first["baseline_exists"], false);
    assert_eq!(first["has_differences"], false);

    let second = ws.json(&check);
    assert_eq!(second["baseline_exists"], true);
    assert_eq!(second["diff_pixel_count"], 0);
    assert!(second.get("diff_path").is_none());

    write_png(&ws.path().join("login.png"), [30, 90, 200, 255]);
    let changed = ws.run(&check);
    assert!(!changed.status.success(), "differences must fail the command");
    let result: Value = serde_json::from_slice(&changed.stdout).unwrap();
    assert_eq!(result["has_differences"], true);
    assert!(ws.path().join(result["diff_path"].as_str().unwrap()).exists());

    ws.json(&["baseline", "--baseline-dir", "baselines", "update", "login page"]);
    let accepted = ws.json(&check);
    assert_eq!(accepted["has_differences"], false);
}
