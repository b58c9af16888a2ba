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

//! Benchmarks each revision in turn and puts the workspace back afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{self, NewArtifact};
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::process::{CommandLine, ProcessRunner, Sink};
use crate::revision::Workspace;

/// Output of one benchmarked revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionResult {
    pub revision: String,
    pub path: PathBuf,
}

pub struct Orchestrator<'a> {
    workspace: &'a Workspace,
    runner: &'a ProcessRunner,
    bench: &'a CommandLine,
    outdir: &'a Path,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        workspace: &'a Workspace,
        runner: &'a ProcessRunner,
        bench: &'a CommandLine,
        outdir: &'a Path,
    ) -> Self {
        Self {
            workspace,
            runner,
            bench,
            outdir,
        }
    }

    /// Benchmarks `revisions` in the given order and returns their results
    /// in that same order.
    ///
    /// Refuses to start on a dirty tree. Once the original branch has been
    /// recorded it is checked out again before this returns, whether the run
    /// succeeded, failed or was interrupted.
    pub fn run(&self, revisions: &[String]) -> Result<Vec<RevisionResult>> {
        let ctx = self.runner.context();
        if revisions.len() < 2 {
            return Err(Error::Usage("not enough commits to compare".to_string()));
        }

        ctx.checkpoint(
            fs::create_dir_all(self.outdir)
                .map_err(|e| Error::io("cannot create output directory", e)),
        )?;
        ctx.checkpoint(self.workspace.tree_is_clean())?;
        let original = ctx.checkpoint(self.workspace.current_reference())?;
        let mut restore = RestoreGuard::new(self.workspace, ctx, original);

        let mut results = Vec::with_capacity(revisions.len());
        for revision in revisions {
            let path = self
                .bench_revision(revision)
                .map_err(|e| e.for_revision(revision))?;
            results.push(RevisionResult {
                revision: revision.clone(),
                path,
            });
        }

        restore.restore()?;
        ctx.checkpoint(Ok(results))
    }

    fn bench_revision(&self, revision: &str) -> Result<PathBuf> {
        let ctx = self.runner.context();
        let NewArtifact { path, file } = ctx.checkpoint(artifact::create(
            self.outdir,
            revision,
            |rev| self.workspace.resolve_hash(rev),
        ))?;

        ctx.checkpoint(self.workspace.checkout(revision))?;

        log::info!("running benchmark...");
        ctx.checkpoint(self.runner.run(self.bench, &[], Sink::File(file)))?;
        log::debug!("benchmark results for {} in {}", revision, path.display());
        Ok(path)
    }
}

/// Checks the original branch out again exactly once: explicitly on the
/// success path, from `Drop` on every other.
struct RestoreGuard<'a> {
    workspace: &'a Workspace,
    ctx: &'a RunContext,
    reference: String,
    done: bool,
}

impl<'a> RestoreGuard<'a> {
    fn new(workspace: &'a Workspace, ctx: &'a RunContext, reference: String) -> Self {
        Self {
            workspace,
            ctx,
            reference,
            done: false,
        }
    }

    fn restore(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        // Nothing may still be writing into the tree.
        self.ctx.kill_if_any();
        log::info!("restoring original reference {}", self.reference);
        self.workspace.checkout(&self.reference)
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::error!("cannot restore {}: {}", self.reference, e);
            eprintln!(
                "gitbenchcmp: cannot restore {}: {}; run `git checkout {}` manually",
                self.reference, e, self.reference
            );
        }
    }
}
