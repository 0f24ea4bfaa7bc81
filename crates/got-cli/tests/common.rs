#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use assert_cmd::assert::Assert;
use serde_json::Value;
use tempfile::TempDir;
use url::Url;

/// A scratch git repository with a `file://` remote directory next to it.
pub struct Sandbox {
    _temp: TempDir,
    pub repo: PathBuf,
    pub remote: PathBuf,
    pub cache: PathBuf,
    pub home: PathBuf,
}

impl Sandbox {
    pub fn remote_url(&self) -> String {
        Url::from_directory_path(&self.remote)
            .expect("remote url")
            .to_string()
    }

    pub fn command(&self) -> assert_cmd::Command {
        self.command_in(&self.repo)
    }

    pub fn command_in(&self, dir: &Path) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("git-got");
        cmd.current_dir(dir)
            .env("HOME", &self.home)
            .env("GOT_CACHE_PATH", &self.cache)
            .env("GOT_PROGRESS", "0")
            .env("NO_COLOR", "1")
            .env_remove("GOT_HTTP_TIMEOUT");
        cmd
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.repo.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    pub fn sidecar(&self, relative: &str) -> PathBuf {
        let path = self.repo.join(relative);
        let name = path.file_name().expect("file name").to_string_lossy();
        path.with_file_name(format!(".{name}.got"))
    }

    pub fn record(&self, relative: &str) -> Value {
        let raw = fs::read_to_string(self.sidecar(relative)).expect("read sidecar");
        serde_json::from_str(&raw).expect("sidecar json")
    }

    pub fn staged(&self) -> Vec<String> {
        let output = Command::new("git")
            .args(["diff", "--cached", "--name-only"])
            .current_dir(&self.repo)
            .output()
            .expect("git diff");
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn init_got(&self) {
        self.command()
            .args(["init", "origin", "file", &self.remote_url()])
            .assert()
            .success();
    }
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Returns `None` (after logging) when no git binary is on PATH.
pub fn sandbox() -> Option<Sandbox> {
    if !git_available() {
        eprintln!("skipping git-got cli test (git not found)");
        return None;
    }
    let temp = tempfile::Builder::new()
        .prefix("git-got-cli")
        .tempdir()
        .expect("tempdir");
    let base = temp.path().canonicalize().expect("canonical tempdir");
    let repo = base.join("repo");
    let remote = base.join("remote");
    let cache = base.join("cache");
    let home = base.join("home");
    for dir in [&repo, &remote, &home] {
        fs::create_dir_all(dir).expect("create dir");
    }
    let status = Command::new("git")
        .args(["init", "--quiet"])
        .current_dir(&repo)
        .status()
        .expect("git init");
    assert!(status.success(), "git init failed");
    Some(Sandbox {
        _temp: temp,
        repo,
        remote,
        cache,
        home,
    })
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn stdout(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

pub fn stderr(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}
