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

//! Error type shared by every stage of a benchmark run.
//!
//! Messages never repeat their source; print the whole chain with `{:#}`
//! through anyhow.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("command not found: {0}")]
    ToolNotFound(String),

    #[error("working tree is dirty")]
    DirtyTree,

    #[error("HEAD is not on a branch; cannot restore it after the run")]
    DetachedHead,

    #[error("cannot {action}")]
    Git {
        action: String,
        #[source]
        source: git2::Error,
    },

    #[error("cannot start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {status}")]
    CommandFailed { program: String, status: ExitStatus },

    #[error("cannot create result file {}", path.display())]
    ArtifactNaming {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot benchmark {revision}")]
    Revision {
        revision: String,
        #[source]
        source: Box<Error>,
    },

    #[error("cannot install interrupt handler")]
    Signal(#[from] ctrlc::Error),

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    pub(crate) fn git(action: impl Into<String>, source: git2::Error) -> Self {
        Error::Git {
            action: action.into(),
            source,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Attaches the revision being processed. Interruptions pass through
    /// unchanged.
    pub(crate) fn for_revision(self, revision: &str) -> Self {
        match self {
            Error::Interrupted => Error::Interrupted,
            other => Error::Revision {
                revision: revision.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}
