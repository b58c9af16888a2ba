// gitbenchcmp - Benchmark comparison across git revisions
// Copyright (c) 2025 Oliver Seifert
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

#![cfg(unix)]

mod common;

use std::fs;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use common::{TestRepo, list_dir, outdir_in, wait_until};

const CAT: &str = "cat bench.txt\n";

fn gitbenchcmp(repo: &TestRepo) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gitbenchcmp"));
    cmd.current_dir(repo.path());
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run gitbenchcmp")
}

#[test]
fn test_one_revision_is_usage_error() {
    let repo = TestRepo::with_benchmarks(&[("v1", CAT)]);
    let output = run(gitbenchcmp(&repo).arg("v1"));

    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
    assert_eq!(repo.head_branch().as_deref(), Some("refs/heads/main"));
}

#[test]
fn test_no_arguments_is_usage_error() {
    let repo = TestRepo::with_benchmarks(&[("v1", CAT)]);
    let output = run(&mut gitbenchcmp(&repo));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let repo = TestRepo::new();
    let output = run(gitbenchcmp(&repo).arg("-help"));
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("outdir"));
}

#[test]
fn test_compares_two_revisions() {
    let repo = TestRepo::with_benchmarks(&[("v1", CAT), ("v2", CAT)]);
    let scratch = tempfile::tempdir().unwrap();
    let outdir = outdir_in(&scratch);

    let output = run(gitbenchcmp(&repo)
        .arg("-outdir")
        .arg(&outdir)
        .args(["-bench-cmd", "sh bench.sh", "-compare-cmd", "cat", "v1", "v2"]));

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "\noutput of v1\noutput of v2\n"
    );
    // Diagnostics are off without -verbose.
    assert!(output.stderr.is_empty());
    assert_eq!(list_dir(&outdir), vec!["v1", "v2"]);
    assert_eq!(repo.head_branch().as_deref(), Some("refs/heads/main"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let repo = TestRepo::with_benchmarks(&[("v1", CAT), ("v2", CAT)]);
    let output = run(gitbenchcmp(&repo)
        .env_remove("RUST_LOG")
        .args(["-verbose", "-bench-cmd", "sh bench.sh", "-compare-cmd", "true", "v1", "v2"]));

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("checking out v1"), "{stderr}");
    assert!(stderr.contains("restoring original reference main"), "{stderr}");
}

#[test]
fn test_dirty_tree_exits_one() {
    let repo = TestRepo::with_benchmarks(&[("v1", CAT), ("v2", CAT)]);
    fs::write(repo.path().join("bench.txt"), "uncommitted\n").unwrap();

    let output = run(gitbenchcmp(&repo).args(["-bench-cmd", "sh bench.sh", "-compare-cmd", "cat", "v1", "v2"]));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dirty"), "{stderr}");
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
    assert_eq!(repo.read("bench.txt"), "uncommitted\n");
}

#[test]
fn test_missing_tool_exits_one() {
    let repo = TestRepo::with_benchmarks(&[("v1", CAT), ("v2", CAT)]);
    let output = run(gitbenchcmp(&repo).args([
        "-bench-cmd",
        "gitbenchcmp-no-such-program",
        "v1",
        "v2",
    ]));
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("command not found"));
}

#[test]
fn test_sigint_kills_benchmark_and_restores() {
    let repo = TestRepo::with_benchmarks(&[
        ("v1", CAT),
        ("v2", "cat bench.txt\nexec sleep 30\n"),
        ("v3", CAT),
    ]);
    let scratch = tempfile::tempdir().unwrap();
    let outdir = outdir_in(&scratch);

    let mut child = gitbenchcmp(&repo)
        .arg("-outdir")
        .arg(&outdir)
        .args(["-bench-cmd", "sh bench.sh", "-compare-cmd", "cat", "v1", "v2", "v3"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let second = outdir.join("v2");
    wait_until(Duration::from_secs(20), || {
        fs::read_to_string(&second).is_ok_and(|s| !s.is_empty())
    });
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -INT {}", child.id()))
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("interrupted"));
    assert_eq!(list_dir(&outdir), vec!["v1", "v2"]);
    assert_eq!(repo.head_branch().as_deref(), Some("refs/heads/main"));
    assert_eq!(repo.read("bench.txt"), "output of main\n");
}
