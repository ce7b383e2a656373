//! CLI round trips through the codeweave binary

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliEnv {
    _temp: TempDir,
    home: std::path::PathBuf,
    workspace: std::path::PathBuf,
    store: std::path::PathBuf,
}

impl CliEnv {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let workspace = temp.path().join("ws");
        let store = temp.path().join("store");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&workspace).unwrap();
        Self {
            _temp: temp,
            home,
            workspace,
            store,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_codeweave"))
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", self.home.join(".config"))
            .env_remove("CODEWEAVE_LOG")
            .arg("--quiet")
            .arg("--workspace")
            .arg(&self.workspace)
            .arg("--store")
            .arg(&self.store)
            .args(args)
            .output()
            .unwrap()
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "codeweave {:?} should succeed: stderr={:?}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim_end().to_string()
    }
}

#[test]
fn test_set_then_render_footer() {
    let env = CliEnv::new();
    env.run_ok(&["set", "rules", "about"]);
    env.run_ok(&["set", "script", "--content", "track();"]);
    env.run_ok(&["set", "resource", "--id", "7", "--content", "echo(\"[page]\");"]);

    let footer = env.run_ok(&[
        "render", "--singular", "--resource-id", "7", "--slug", "about", "--type", "page",
    ]);
    assert_eq!(footer, "<script>track();</script>[page]");

    let other = env.run_ok(&["render", "--singular", "--resource-id", "8", "--slug", "contact"]);
    assert_eq!(other, "");
}

#[test]
fn test_render_head_from_style_file() {
    let env = CliEnv::new();
    let css = env.workspace.join("site.css");
    fs::write(&css, "body { margin: 0; }\n").unwrap();

    env.run_ok(&["set", "rules", "all"]);
    env.run_ok(&["set", "style", "--file", css.to_str().unwrap()]);

    let head = env.run_ok(&["render", "--point", "head"]);
    assert_eq!(head, "<style>body { margin: 0; }</style>");
}

#[test]
fn test_check_reports_matching_rule() {
    let env = CliEnv::new();
    env.run_ok(&["set", "rules", "post-12, category-news"]);

    let out = env.run_ok(&["check", "--category", "news"]);
    assert!(out.contains("matched 'category-news'"), "got: {}", out);

    let out = env.run_ok(&["check", "--rules", "contact", "--singular", "--slug", "about"]);
    assert!(out.ends_with("Result: skip (no rule matched)"), "got: {}", out);
}

#[test]
fn test_exec_success_and_failure() {
    let env = CliEnv::new();
    let out = env.run_ok(&["exec", "--content", "echo(\"a\"); print(\"b\");"]);
    assert_eq!(out, "ab");

    let output = env.run(&["exec", "--content", "throw \"boom\";"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Script error: boom"), "stderr={}", stderr);
}

#[test]
fn test_list_and_clear() {
    let env = CliEnv::new();
    env.run_ok(&["set", "server", "--content", "echo(1);"]);
    env.run_ok(&["set", "resource", "--id", "3", "--content", "echo(3);"]);

    let json = env.run_ok(&["list", "--format", "json"]);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total"], 2);
    assert_eq!(value["fragments"][0]["scope"], "global");
    assert_eq!(value["fragments"][1]["scope"], "resource:3");

    assert_eq!(
        env.run_ok(&["clear", "resource", "--id", "3"]),
        "Removed server script for resource 3"
    );
    assert_eq!(
        env.run_ok(&["clear", "resource", "--id", "3"]),
        "Nothing stored for resource 3"
    );

    let text = env.run_ok(&["list"]);
    assert!(text.contains("server_script"));
    assert!(text.ends_with("Total: 1 fragment(s)"));
}

#[test]
fn test_store_defaults_to_workspace_config_path() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    let home = temp.path().join("home");
    fs::create_dir_all(workspace.join("config")).unwrap();
    fs::create_dir_all(&home).unwrap();
    fs::write(
        workspace.join("config").join("config.toml"),
        "[store]\npath = \"fragments\"\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_codeweave"))
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .arg("--quiet")
        .arg("--workspace")
        .arg(&workspace)
        .args(["set", "rules", "all"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(workspace.join("fragments").is_dir());
}
