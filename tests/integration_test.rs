use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SHELL_MODULE: &str = r#"
variables:
  greeting: hello
files:
  "{ROOTDIR}/home/.zshrc": zshrc
  "{ROOTDIR}/home/.config/greeting.txt":
    template: "{greeting} from {ROOTDIR}"
directories:
  "{ROOTDIR}/home/.config/nvim": nvim
"#;

/// A root with one `shell` module, its dotfiles and no providers.
fn setup_root(root: &Path, config: &str) {
    fs::write(root.join("config.yaml"), config).unwrap();
    fs::create_dir_all(root.join("modules")).unwrap();
    fs::write(root.join("modules/shell.yaml"), SHELL_MODULE).unwrap();
    fs::create_dir_all(root.join("dotfiles/nvim")).unwrap();
    fs::write(root.join("dotfiles/zshrc"), "export EDITOR=nvim\n").unwrap();
}

fn sysdef(root: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("sysdef"));
    cmd.arg("--root").arg(root).env("HOME", root).env_remove("SYSDEF_ROOT_DIR");
    cmd
}

#[test]
fn test_sync_files_only_links_and_generates() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "modules: [shell]\n");

    sysdef(root)
        .args(["sync", "--files-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Linked file:"))
        .stdout(predicate::str::contains("Linked directory:"))
        .stdout(predicate::str::contains("Generated:"));

    let zshrc = root.join("home/.zshrc");
    assert_eq!(fs::read_link(&zshrc).unwrap(), root.join("dotfiles/zshrc"));
    assert_eq!(fs::read_to_string(&zshrc).unwrap(), "export EDITOR=nvim\n");
    assert_eq!(
        fs::read_link(root.join("home/.config/nvim")).unwrap(),
        root.join("dotfiles/nvim")
    );
    assert_eq!(
        fs::read_to_string(root.join("home/.config/greeting.txt")).unwrap(),
        format!("hello from {}", root.display())
    );
    // Files-only never touches the lockfile.
    assert!(!root.join("sysdef-lock.json").exists());

    // A second run finds everything in place.
    sysdef(root)
        .args(["sync", "--files-only"])
        .assert()
        .success();
    assert_eq!(fs::read_link(&zshrc).unwrap(), root.join("dotfiles/zshrc"));
}

#[test]
fn test_sync_dry_run_changes_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "modules: [shell]\n");

    sysdef(root)
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create symlink"))
        .stdout(predicate::str::contains("Would be writing to"));

    assert!(!root.join("home").exists());
    assert!(!root.join("sysdef-lock.json").exists());
}

#[test]
fn test_full_sync_runs_hooks_and_writes_lockfile() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "modules: [shell, hooks]\n");
    fs::write(
        root.join("modules/hooks.yaml"),
        "on_every_sync:\n  - echo hook-ran\n",
    )
    .unwrap();

    sysdef(root)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("RUNNING EVENTS:"))
        .stdout(predicate::str::contains("hook-ran"));

    let lockfile = fs::read_to_string(root.join("sysdef-lock.json")).unwrap();
    assert_eq!(lockfile.trim(), "{}");
}

#[test]
fn test_failing_hook_fails_sync() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "modules: [hooks]\n");
    fs::write(root.join("modules/hooks.yaml"), "on_every_sync: [\"exit 3\"]\n").unwrap();

    sysdef(root)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hook for module hooks failed"));
    assert!(!root.join("sysdef-lock.json").exists());
}

#[test]
fn test_missing_module_is_fatal() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "modules: [shell, ghost]\n");

    sysdef(root)
        .args(["sync", "--files-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Module ghost was not found"));
    assert!(!root.join("home").exists());
}

#[test]
fn test_unknown_provider_is_fatal() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "providers: [npm]\nmodules: [shell]\n");

    sysdef(root)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Provider npm was not found"));
}

#[test]
fn test_missing_config_is_fatal() {
    let dir = tempdir().unwrap();

    sysdef(dir.path())
        .arg("providers")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No config.yaml found"));
}

#[test]
fn test_providers_without_any_configured() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "modules: [shell]\n");

    sysdef(root)
        .arg("providers")
        .assert()
        .success()
        .stdout(predicate::str::contains("No providers configured."));
}

#[test]
fn test_root_from_env() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    setup_root(root, "modules: [shell]\n");

    Command::new(cargo::cargo_bin!("sysdef"))
        .env("SYSDEF_ROOT_DIR", root)
        .args(["sync", "--files-only"])
        .assert()
        .success();
    assert!(root.join("home/.zshrc").exists());
}
