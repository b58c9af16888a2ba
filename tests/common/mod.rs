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

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Throwaway repository on branch `main`.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();
        Self { dir, repo }
    }

    /// One tagged commit per `(tag, script)`: `bench.sh` holds the script
    /// and `bench.txt` holds `<tag output>`. A final commit stays on `main`.
    pub fn with_benchmarks(revisions: &[(&str, &str)]) -> Self {
        let repo = Self::new();
        for (tag, script) in revisions {
            let output = format!("output of {}\n", tag);
            let id = repo.commit(&[("bench.sh", script), ("bench.txt", &output)], tag);
            repo.tag(tag, id);
        }
        repo.commit(
            &[("bench.sh", "echo main\n"), ("bench.txt", "output of main\n")],
            "tip",
        );
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let mut index = self.repo.index().unwrap();
        for (name, contents) in files {
            fs::write(self.path().join(name), contents).unwrap();
            index.add_path(Path::new(name)).unwrap();
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("bench", "bench@example.com").unwrap();
        let parent = self
            .repo
            .head()
            .ok()
            .map(|head| head.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    pub fn tag(&self, name: &str, id: Oid) {
        let object = self.repo.find_object(id, None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    pub fn branch(&self, name: &str, id: Oid) {
        let commit = self.repo.find_commit(id).unwrap();
        self.repo.branch(name, &commit, false).unwrap();
    }

    pub fn hash_of(&self, revision: &str) -> String {
        self.repo
            .revparse_single(revision)
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .id()
            .to_string()
    }

    /// Branch HEAD points to, or `None` when detached.
    pub fn head_branch(&self) -> Option<String> {
        let head = self.repo.find_reference("HEAD").unwrap();
        head.symbolic_target().map(str::to_string)
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).unwrap()
    }
}

pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Polls `condition` until it holds. Panics after `timeout`.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        assert!(start.elapsed() < timeout, "timed out waiting");
        thread::sleep(Duration::from_millis(10));
    }
}

pub fn outdir_in(dir: &TempDir) -> PathBuf {
    dir.path().join("results")
}
