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

//! Runs one external command at a time and keeps it killable.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::context::RunContext;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A program plus its fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits on whitespace. Returns `None` for a blank string.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program, words))
    }

    pub fn push_arg(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Where a child's standard output goes.
#[derive(Debug)]
pub enum Sink {
    Inherit,
    File(File),
}

impl Sink {
    pub fn try_clone(&self) -> io::Result<Sink> {
        match self {
            Sink::Inherit => Ok(Sink::Inherit),
            Sink::File(file) => file.try_clone().map(Sink::File),
        }
    }

    /// Writes an empty line into the sink.
    pub fn write_blank_line(&mut self) -> io::Result<()> {
        match self {
            Sink::Inherit => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout)?;
                stdout.flush()
            }
            Sink::File(file) => writeln!(file),
        }
    }

    fn into_stdio(self) -> Stdio {
        match self {
            Sink::Inherit => Stdio::inherit(),
            Sink::File(file) => Stdio::from(file),
        }
    }
}

pub struct ProcessRunner {
    ctx: Arc<RunContext>,
    workdir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(ctx: Arc<RunContext>) -> Self {
        Self { ctx, workdir: None }
    }

    /// Runs children in `dir` instead of the current directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.ctx
    }

    /// Runs `command` with `trailing` appended to its arguments and blocks
    /// until it exits. Standard error is inherited.
    ///
    /// The child is registered with the run context for its whole lifetime,
    /// so an interrupt can kill it; the kill surfaces here as a failed exit
    /// status.
    pub fn run(&self, command: &CommandLine, trailing: &[&Path], stdout: Sink) -> Result<()> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .args(trailing)
            .stdin(Stdio::null())
            .stdout(stdout.into_stdio())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        self.ctx.checkpoint(Ok(()))?;
        let child = cmd.spawn().map_err(|source| Error::Spawn {
            program: command.program.clone(),
            source,
        })?;
        // Drop our copies of the redirected handles now that the child owns them.
        drop(cmd);
        log::debug!("started {} (pid {})", command, child.id());
        let registration = self.ctx.register(&command.program, child);

        let status = loop {
            match self.ctx.try_collect(registration) {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    self.ctx.release(registration);
                    return Err(Error::io(format!("cannot wait for {}", command.program), source));
                }
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                program: command.program.clone(),
                status,
            })
        }
    }
}
