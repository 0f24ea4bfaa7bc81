use predicates::str::contains;

mod common;

use common::{parse_json, sandbox};

#[test]
fn commands_before_init_are_user_errors() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.write("data.bin", b"x");
    sb.command()
        .args(["add", "data.bin"])
        .assert()
        .code(1)
        .stderr(contains("Got not initialized"));
}

#[test]
fn untracked_files_report_not_tracked_in_json() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.init_got();
    let assert = sb
        .command()
        .args(["--json", "get", "ghost.bin"])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "user-error");
    assert_eq!(payload["details"]["code"], "GOT110");
    assert_eq!(
        payload["message"],
        "got get: Failed to retrieve file 'ghost.bin': 'ghost.bin' is not tracked by got"
    );
}

#[test]
fn directories_and_outside_paths_are_rejected() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.init_got();
    sb.write("dir/a.bin", b"a");
    sb.command()
        .args(["add", "dir"])
        .assert()
        .code(1)
        .stderr(contains("Got only allows files, not subdirectories, to be added"));
    sb.command()
        .args(["add"])
        .assert()
        .code(1)
        .stderr(contains("Not enough arguments to add command"));

    let outside = sb.home.join("outside.bin");
    std::fs::write(&outside, b"o").expect("write outside");
    sb.command()
        .args(["add", outside.to_str().expect("utf8 path")])
        .assert()
        .code(1)
        .stderr(contains("is not located in the git repository"));
}

#[test]
fn missing_remote_objects_are_failures() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.init_got();
    sb.write("data.bin", b"payload");
    sb.command().args(["add", "data.bin"]).assert().success();
    std::fs::remove_file(sb.repo.join("data.bin")).expect("remove working file");
    std::fs::remove_dir_all(&sb.cache).expect("drop cache");
    for entry in std::fs::read_dir(&sb.remote).expect("remote dir") {
        std::fs::remove_file(entry.expect("entry").path()).expect("drop object");
    }

    sb.command()
        .arg("get")
        .assert()
        .code(2)
        .stderr(contains("Failed to retrieve file 'data.bin'"));
}

#[test]
fn argument_errors_exit_with_one() {
    let Some(sb) = sandbox() else {
        return;
    };
    sb.command().args(["mv", "only-one"]).assert().code(1);
    sb.command().args(["-d", "9", "status"]).assert().code(1);
    sb.command().arg("--help").assert().success();
}
