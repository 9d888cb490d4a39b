//! Runs the `ratchet` binary against small on-disk projects.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
    config: PathBuf,
}

fn project(config: &str) -> Project {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let files = [
        ("src/leaf.ts", "export const leaf = 1;\n"),
        ("src/mid.ts", "import { leaf } from './leaf';\n"),
        ("src/bad.ts", "import { mid } from './mid';\n"),
        ("src/ring/a.ts", "import { b } from './b';\n"),
        ("src/ring/b.ts", "import { a } from './a';\n"),
    ];
    for (rel, contents) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    let config_path = root.join("tsconfig.strict.json");
    fs::write(&config_path, config).unwrap();
    Project {
        _dir: dir,
        root,
        config: config_path,
    }
}

fn ratchet(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ratchet"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "warn")
        .env_remove("RATCHET_TSC")
        .output()
        .unwrap()
}

#[test]
fn find_cycles_lists_cycles_then_singles() {
    let p = project("{}");
    let out = ratchet(&["find-cycles", p.config.to_str().unwrap()], &p.root);
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let expected = "\
Found import cycle of 2 units
    src/ring/a.ts
    src/ring/b.ts
Found 1 import cycle(s)
Units outside any cycle (3)
    src/bad.ts
    src/leaf.ts
    src/mid.ts
";
    assert_eq!(stdout, expected);
}

#[test]
fn visualize_writes_json_dump() {
    let p = project(r#"{"files": ["./src/leaf.ts"]}"#);
    let output = p.root.join("nodes.json");
    let out = ratchet(
        &[
            "visualize",
            p.config.to_str().unwrap(),
            "--format",
            "json",
            "--output",
            output.to_str().unwrap(),
        ],
        &p.root,
    );
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Current progress 1/5"));
    assert!(stdout.contains("Current eligible unit count: 3"));

    let nodes: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let nodes = nodes.as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    let leaf = nodes
        .iter()
        .find(|n| n["files"] == serde_json::json!(["src/leaf.ts"]))
        .unwrap();
    assert_eq!(leaf["checked"], true);
    assert_eq!(leaf["eligible"], false);
    assert!(leaf["errorCount"].is_null());
}

#[test]
fn missing_config_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let out = ratchet(&["find-cycles", "does-not-exist.json"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8(out.stderr).unwrap().contains("Error:"));
}

/// Reports one error per config line mentioning `bad`, after the initial
/// build and after every change to its config.
#[cfg(unix)]
const FAKE_TSC: &str = r#"
config="$2"
last=$(cat "$config")
echo "Found 0 errors. Watching for file changes."
while true; do
  current=$(cat "$config" 2>/dev/null)
  if [ "$current" != "$last" ]; then
    last="$current"
    count=$(grep -c bad "$config")
    echo "Found $count errors. Watching for file changes."
  fi
  sleep 0.05
done
"#;

#[cfg(unix)]
#[test]
fn auto_add_accepts_clean_units_until_fixpoint() {
    let p = project(r#"{"compilerOptions": {"strictNullChecks": true}, "files": []}"#);
    let scripts = tempfile::tempdir().unwrap();
    let script = scripts.path().join("fake-tsc.sh");
    fs::write(&script, FAKE_TSC).unwrap();

    let out = ratchet(
        &[
            "auto-add",
            p.config.to_str().unwrap(),
            "--interpreter",
            "/bin/sh",
            "--tsc",
            script.to_str().unwrap(),
            "--startup-timeout-secs",
            "10",
            "--submit-timeout-secs",
            "10",
            "--json",
        ],
        &p.root,
    );
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&p.config).unwrap()).unwrap();
    assert_eq!(
        config["files"],
        serde_json::json!([
            "./src/leaf.ts",
            "./src/mid.ts",
            "./src/ring/a.ts",
            "./src/ring/b.ts"
        ])
    );
    assert_eq!(config["compilerOptions"]["strictNullChecks"], true);

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["passes"], 3);
    assert_eq!(report["accepted_units"], 4);
    assert_eq!(report["total_units"], 5);

    let leftovers = fs::read_dir(&p.root)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().starts_with(".ratchet-"))
        .count();
    assert_eq!(leftovers, 0);
}

#[cfg(unix)]
#[test]
fn remove_from_exclude_lists_glob_excluded_units_under_files() {
    let p = project(r#"{"include": ["src/**/*"], "exclude": ["src/ring/**"]}"#);
    let scripts = tempfile::tempdir().unwrap();
    let script = scripts.path().join("fake-tsc.sh");
    fs::write(&script, FAKE_TSC).unwrap();

    let out = ratchet(
        &[
            "auto-add",
            p.config.to_str().unwrap(),
            "--interpreter",
            "/bin/sh",
            "--tsc",
            script.to_str().unwrap(),
            "--mode",
            "remove-from-exclude",
            "--startup-timeout-secs",
            "10",
            "--submit-timeout-secs",
            "10",
            "--json",
        ],
        &p.root,
    );
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&p.config).unwrap()).unwrap();
    assert_eq!(config["exclude"], serde_json::json!(["src/ring/**"]));
    assert_eq!(
        config["files"],
        serde_json::json!(["./src/ring/a.ts", "./src/ring/b.ts"])
    );

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["passes"], 1);
    assert_eq!(report["accepted_units"], 5);
    assert_eq!(report["attempts"][0]["outcome"], "accepted");
}
