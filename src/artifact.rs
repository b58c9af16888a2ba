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

//! Result files: one per revision, created exclusively and never overwritten.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Hex digits of the commit hash used in fallback names.
pub const HASH_PREFIX_LEN: usize = 12;

/// A freshly created, still empty result file.
#[derive(Debug)]
pub struct NewArtifact {
    pub path: PathBuf,
    pub file: File,
}

/// Why a candidate name could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clash {
    /// A file with that name is already there.
    Exists,
    /// The name cannot be a single file name here, e.g. `origin/main`.
    Unusable,
}

enum Attempt {
    Created(File),
    Clash(Clash, io::Error),
    Failed(io::Error),
}

/// Creates the result file for `revision` under `outdir`.
///
/// Tries `<outdir>/<revision>` first. If that name is taken or unusable the
/// revision is resolved with `resolve_hash` and `<outdir>/<hash12>` is tried
/// once. Any other failure, and any failure on the hash name, is fatal.
pub fn create<F>(outdir: &Path, revision: &str, resolve_hash: F) -> Result<NewArtifact>
where
    F: FnOnce(&str) -> Result<String>,
{
    let primary = outdir.join(revision);
    log::debug!("creating benchmark file: {}", primary.display());
    match try_create(outdir, revision) {
        Attempt::Created(file) => return Ok(NewArtifact { path: primary, file }),
        Attempt::Clash(clash, err) => {
            log::debug!("cannot use {} ({:?}): {}", primary.display(), clash, err)
        }
        Attempt::Failed(source) => {
            return Err(Error::ArtifactNaming {
                path: primary,
                source,
            });
        }
    }

    let hash = resolve_hash(revision)?;
    let short = hash.get(..HASH_PREFIX_LEN).unwrap_or(&hash).to_string();

    let by_hash = outdir.join(&short);
    log::debug!("using hash instead: {}", by_hash.display());
    match try_create(outdir, &short) {
        Attempt::Created(file) => Ok(NewArtifact { path: by_hash, file }),
        Attempt::Clash(_, source) | Attempt::Failed(source) => Err(Error::ArtifactNaming {
            path: by_hash,
            source,
        }),
    }
}

fn try_create(outdir: &Path, name: &str) -> Attempt {
    if !is_plain_file_name(name) {
        return Attempt::Clash(
            Clash::Unusable,
            io::Error::new(ErrorKind::InvalidInput, "not a plain file name"),
        );
    }
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(outdir.join(name))
    {
        Ok(file) => Attempt::Created(file),
        Err(e) => match classify(&e) {
            Some(clash) => Attempt::Clash(clash, e),
            None => Attempt::Failed(e),
        },
    }
}

fn classify(err: &io::Error) -> Option<Clash> {
    match err.kind() {
        ErrorKind::AlreadyExists => Some(Clash::Exists),
        ErrorKind::NotFound | ErrorKind::InvalidInput | ErrorKind::InvalidFilename => {
            Some(Clash::Unusable)
        }
        _ => None,
    }
}

/// True when `name` is exactly one normal path component.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains('\0') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.ends_with(std::path::MAIN_SEPARATOR)
}
