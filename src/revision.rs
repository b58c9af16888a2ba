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

//! Version-control operations on the repository being benchmarked.

use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{BranchType, Commit, Repository, StatusOptions};

use crate::error::{Error, Result};

const BRANCH_PREFIX: &str = "refs/heads/";

/// The git working copy the benchmarks run in.
pub struct Workspace {
    repo: Repository,
}

impl Workspace {
    /// Finds the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| {
            Error::git(format!("find a git repository at {}", path.display()), e)
        })?;
        if repo.is_bare() {
            return Err(Error::Usage(format!(
                "{} is a bare repository",
                repo.path().display()
            )));
        }
        Ok(Self { repo })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .map_err(|e| Error::git(format!("open repository {}", path.display()), e))?;
        Ok(Self { repo })
    }

    /// Short name of the branch HEAD points to.
    pub fn current_reference(&self) -> Result<String> {
        log::debug!("getting HEAD ref");
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| Error::git("read HEAD", e))?;
        head.symbolic_target()
            .and_then(|target| target.strip_prefix(BRANCH_PREFIX))
            .map(str::to_string)
            .ok_or(Error::DetachedHead)
    }

    /// Fails with `Error::DirtyTree` when tracked files differ from HEAD in
    /// the index or the working tree. Untracked files are ignored.
    pub fn tree_is_clean(&self) -> Result<()> {
        log::debug!("checking if the tree is clean");
        let mut opts = StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| Error::git("read working tree status", e))?;
        let dirty = statuses
            .iter()
            .any(|entry| !entry.status().is_empty() && !entry.status().is_ignored());
        if dirty { Err(Error::DirtyTree) } else { Ok(()) }
    }

    /// Switches the working tree to `revision`. A local branch of that name
    /// wins over any tag or other ref, as with `git checkout`; HEAD then
    /// follows the branch. Anything else leaves HEAD detached.
    pub fn checkout(&self, revision: &str) -> Result<()> {
        log::info!("checking out {}", revision);
        let action = || format!("checkout {}", revision);
        let branch = self.local_branch(revision);
        let commit = self
            .peel(revision, branch.as_deref())
            .map_err(|e| Error::git(action(), e))?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(|e| Error::git(action(), e))?;

        let moved = match &branch {
            Some(refname) => self.repo.set_head(refname),
            None => self.repo.set_head_detached(commit.id()),
        };
        moved.map_err(|e| Error::git(action(), e))
    }

    /// Full commit hash `revision` resolves to, under the same lookup rules
    /// as `checkout`.
    pub fn resolve_hash(&self, revision: &str) -> Result<String> {
        log::debug!("getting commit hash for {}", revision);
        let branch = self.local_branch(revision);
        let commit = self
            .peel(revision, branch.as_deref())
            .map_err(|e| Error::git(format!("get hash for {}", revision), e))?;
        Ok(commit.id().to_string())
    }

    /// Full ref name of the local branch called `name`, if there is one.
    fn local_branch(&self, name: &str) -> Option<String> {
        let branch = self.repo.find_branch(name, BranchType::Local).ok()?;
        branch.get().name().map(str::to_string)
    }

    fn peel(
        &self,
        revision: &str,
        branch: Option<&str>,
    ) -> std::result::Result<Commit<'_>, git2::Error> {
        match branch {
            Some(refname) => self.repo.find_reference(refname)?.peel_to_commit(),
            None => self.repo.revparse_single(revision)?.peel_to_commit(),
        }
    }
}
