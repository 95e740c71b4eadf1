use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_harness(dir: &Path, args: &[&str]) -> Output {
    run_harness_with_env(dir, args, &[])
}

fn run_harness_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sfwa-harness"))
        .current_dir(dir)
        .args(args)
        .env_remove("SFWA_NODE_BIN")
        .env_remove("SFWA_JS_HARNESS")
        .env_remove("SFWA_JS_TIMEOUT_SECS")
        .env("NO_COLOR", "1")
        .envs(env.iter().copied())
        .output()
        .unwrap_or_else(|e| panic!("failed to run sfwa-harness {:?}: {}", args, e))
}

fn setup(spec: &str, html: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("tmpdir");
    let dir = tmp.path().to_path_buf();
    fs::write(dir.join("spec.json"), spec).expect("write spec");
    fs::write(dir.join("app.html"), html).expect("write html");
    (tmp, dir)
}

fn extract_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            e,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

const SPEC: &str = r#"{"abi": "sfwa-abi-1", "contractId": "todo-app",
  "html": {"requires": {"ids": ["app"], "selectors": ["title", "meta[charset]"]}}}"#;
const GOOD_HTML: &str = r#"<!doctype html><html><head><meta charset="utf-8"><title>Todo</title></head>
<body><main id="app"></main></body></html>"#;

#[test]
fn passing_html_check_exits_zero_with_text_report() {
    let (_tmp, dir) = setup(SPEC, GOOD_HTML);
    let out = run_harness(
        &dir,
        &["--spec", "spec.json", "--html", "app.html", "--mode", "html"],
    );
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("SFWA Harness Report: todo-app"));
    assert!(stdout.contains("HTML: PASS"));
    assert!(stdout.contains("Overall: PASS"));
    assert!(!stdout.contains("JS:"));
}

#[test]
fn failing_html_check_exits_one_with_json_report() {
    let (_tmp, dir) = setup(SPEC, "<html><body></body></html>");
    let out = run_harness(
        &dir,
        &["--spec", "spec.json", "--html", "app.html", "--mode", "structural", "--json"],
    );
    assert_eq!(out.status.code(), Some(1));
    let json = extract_json(&out);
    assert_eq!(json["abi"], "sfwa-abi-1");
    assert_eq!(json["ok"], false);
    assert_eq!(json["source"]["spec"], "spec.json");
    let errors = json["results"]["html"]["errors"].as_array().unwrap();
    assert_eq!(errors[0], "Missing required id(s): app");
    assert_eq!(errors[1], "Missing required selector(s): title, meta[charset]");
    assert!(json["results"].get("js").is_none());
}

#[test]
fn unsupported_abi_exits_two() {
    let (_tmp, dir) = setup(r#"{"abi": "other"}"#, GOOD_HTML);
    let out = run_harness(&dir, &["--spec", "spec.json", "--html", "app.html"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unsupported abi 'other'"), "{}", stderr);
}

#[test]
fn unreadable_spec_exits_two() {
    let (_tmp, dir) = setup("{broken", GOOD_HTML);
    let out = run_harness(&dir, &["--spec", "spec.json", "--html", "app.html"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot read spec"));
}

#[test]
fn missing_runtime_fails_js_check_not_harness() {
    let (_tmp, dir) = setup(SPEC, GOOD_HTML);
    let out = run_harness(
        &dir,
        &[
            "--spec", "spec.json", "--html", "app.html", "--mode", "all", "--json",
            "--node-bin", "sfwa-missing-node-91c2",
        ],
    );
    assert_eq!(out.status.code(), Some(1));
    let json = extract_json(&out);
    assert_eq!(json["results"]["html"]["ok"], true);
    assert_eq!(json["results"]["js"]["ok"], false);
    let js_error = json["results"]["js"]["errors"][0].as_str().unwrap();
    assert!(js_error.contains("Node.js not available"), "{}", js_error);
}

#[cfg(unix)]
#[test]
fn js_check_through_configured_runtime() {
    let (_tmp, dir) = setup(SPEC, GOOD_HTML);
    fs::write(dir.join("checker.sh"), "echo '{\"ok\": true}'\n").unwrap();
    fs::write(
        dir.join("sfwa.toml"),
        "node_bin = \"bash\"\njs_harness = \"checker.sh\"\njs_timeout_secs = 20\n",
    )
    .unwrap();
    let out = run_harness(
        &dir,
        &["--spec", "spec.json", "--html", "app.html", "--config", "sfwa.toml"],
    );
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stdout));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("HTML: PASS"));
    assert!(stdout.contains("JS:   PASS"));
}

#[test]
fn bad_config_file_exits_two() {
    let (_tmp, dir) = setup(SPEC, GOOD_HTML);
    fs::write(dir.join("sfwa.toml"), "js_timeout_secs = \"soon\"\n").unwrap();
    let out = run_harness(
        &dir,
        &["--spec", "spec.json", "--html", "app.html", "--config", "sfwa.toml"],
    );
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Configuration error"));
}

#[test]
fn bridge_settings_ignored_in_structural_mode() {
    let (_tmp, dir) = setup(SPEC, GOOD_HTML);
    let env = [("SFWA_JS_TIMEOUT_SECS", "soon")];
    let args = ["--spec", "spec.json", "--html", "app.html"];

    let structural = run_harness_with_env(
        &dir,
        &["--spec", "spec.json", "--html", "app.html", "--mode", "structural"],
        &env,
    );
    assert_eq!(
        structural.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&structural.stderr)
    );

    let both = run_harness_with_env(&dir, &args, &env);
    assert_eq!(both.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&both.stderr).contains("SFWA_JS_TIMEOUT_SECS"));
}
