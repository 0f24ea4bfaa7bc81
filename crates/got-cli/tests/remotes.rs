use std::fs;

use predicates::str::contains;

mod common;

use common::{parse_json, sandbox, stdout};

#[test]
fn init_writes_default_registration_once() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.init_got();
    let raw = fs::read_to_string(sb.repo.join(".got/default")).expect("default registration");
    let registration: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(registration["name"], "origin");
    assert_eq!(registration["remote_type"], "file");
    assert_eq!(registration["default"], true);
    assert!(sb.staged().contains(&".got/default".to_string()));

    sb.command()
        .args(["init", "other", "file", &sb.remote_url()])
        .assert()
        .code(1)
        .stderr(contains("Got remote already initialized!"));
}

#[test]
fn list_add_and_remove_remotes() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.init_got();
    let backup = sb.remote.join("backup");
    fs::create_dir_all(&backup).expect("backup dir");
    let backup_url = url::Url::from_directory_path(&backup)
        .expect("backup url")
        .to_string();

    sb.command()
        .args(["add_remote", "backup", "file", &backup_url])
        .assert()
        .success();
    sb.command()
        .args(["add-remote", "backup", "file", &backup_url])
        .assert()
        .code(1)
        .stderr(contains("a remote with the name 'backup' already exists"));

    let assert = sb.command().arg("list_remotes").assert().success();
    let listing = stdout(&assert);
    assert!(listing.starts_with("   Name:\tType:\tURL:\n"));
    assert!(listing.contains(&format!(" * origin\tfile\t{}", sb.remote_url())));
    assert!(listing.contains(&format!("   backup\tfile\t{backup_url}")));

    sb.write("kept.bin", b"kept");
    sb.command()
        .args(["add", "-r", "backup", "kept.bin"])
        .assert()
        .success();
    assert_eq!(sb.record("kept.bin")["remote"], "backup");

    sb.command()
        .args(["remove_remote", "backup"])
        .assert()
        .code(1)
        .stderr(contains("the following files are linked to it"))
        .stderr(contains("kept.bin"));
    sb.command()
        .args(["remove_remote", "origin"])
        .assert()
        .code(1)
        .stderr(contains("Cannot remove default remote"));

    sb.command().args(["rm", "kept.bin"]).assert().success();
    sb.command()
        .args(["remove_remote", "backup"])
        .assert()
        .success();
    assert!(!sb.repo.join(".got/backup").exists());

    let assert = sb
        .command()
        .args(["--json", "list_remotes"])
        .assert()
        .success();
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "ok");
    let remotes = payload["details"]["remotes"].as_array().expect("remotes");
    assert_eq!(remotes.len(), 1);
    assert_eq!(remotes[0]["name"], "origin");
}

#[test]
fn upgrade_rewrites_legacy_registrations() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.init_got();
    let path = sb.repo.join(".got/default");
    let mut registration: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    registration["version"] = serde_json::json!(0);
    fs::write(&path, registration.to_string()).expect("write legacy");

    sb.command()
        .arg("status")
        .assert()
        .code(1)
        .stderr(contains("git got upgrade"));
    sb.command()
        .arg("upgrade")
        .assert()
        .success()
        .stdout(contains("upgraded origin to version 1"));
    sb.command().arg("status").assert().success();
}
