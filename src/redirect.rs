//! Binding a child's standard output to a redirection target.
//!
//! `>` creates the target and refuses to touch an existing file. `>+` keeps
//! whatever the target held: the child writes into a staging file next to
//! the target, and once it exited the staging file is turned into
//! "old content + new output" and renamed over the target.

use crate::command::{RedirectMode, RedirectionSpec};
use crate::error::{ShellError, SwapStage};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fail with [`ShellError::TargetExists`] if an overwrite target is present.
///
/// Append targets may exist; they are never rejected here.
pub(crate) fn check_target(spec: &RedirectionSpec) -> Result<(), ShellError> {
    if spec.mode == RedirectMode::Overwrite && fs::symlink_metadata(&spec.target).is_ok() {
        return Err(ShellError::TargetExists(spec.target.clone()));
    }
    Ok(())
}

/// Opened destination for one launch.
#[derive(Debug)]
pub(crate) struct PreparedOutput {
    /// Handle given to the child as its standard output.
    pub(crate) file: File,
    /// Work left for after the child exits, for `>+`.
    pub(crate) swap: Option<AppendSwap>,
}

/// Open the file the child will write to.
pub(crate) fn open_output(spec: &RedirectionSpec) -> Result<PreparedOutput, ShellError> {
    match spec.mode {
        RedirectMode::Overwrite => {
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&spec.target)
                .map_err(|source| match source.kind() {
                    io::ErrorKind::AlreadyExists => ShellError::TargetExists(spec.target.clone()),
                    _ => ShellError::OpenTarget {
                        path: spec.target.clone(),
                        source,
                    },
                })?;
            Ok(PreparedOutput { file, swap: None })
        }
        RedirectMode::AppendPreserving => {
            let swap = AppendSwap::new(&spec.target);
            let file = File::create(&swap.staging).map_err(|source| ShellError::OpenTarget {
                path: swap.staging.clone(),
                source,
            })?;
            Ok(PreparedOutput {
                file,
                swap: Some(swap),
            })
        }
    }
}

/// Staging file for `target`: `.<name>.<pid>.swap` in the target's directory.
pub(crate) fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = format!(".{}.{}.swap", name, std::process::id());
    match target.parent() {
        Some(dir) => dir.join(staging),
        None => PathBuf::from(staging),
    }
}

/// Pending post-exit swap of an append-preserving redirection.
#[derive(Debug)]
pub(crate) struct AppendSwap {
    target: PathBuf,
    staging: PathBuf,
}

impl AppendSwap {
    fn new(target: &Path) -> Self {
        Self {
            target: target.to_path_buf(),
            staging: staging_path(target),
        }
    }

    fn failed(stage: SwapStage, path: &Path) -> impl FnOnce(io::Error) -> ShellError + '_ {
        move |source| ShellError::Swap {
            stage,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Move the captured output into place.
    ///
    /// Must only be called once the child exited and its handle is closed.
    /// Every failure here is fatal. Up to the removal of the target the
    /// staging file is cleaned up; after it, the staging file holds the only
    /// copy of the merged content and is left on disk.
    pub(crate) fn commit(self) -> Result<(), ShellError> {
        if self.target.exists() {
            let merged = self.merge_into_staging().and_then(|()| {
                fs::remove_file(&self.target).map_err(Self::failed(SwapStage::Remove, &self.target))
            });
            if let Err(err) = merged {
                self.discard();
                return Err(err);
            }
        }

        fs::rename(&self.staging, &self.target)
            .map_err(Self::failed(SwapStage::Rename, &self.target))?;
        debug!(path = %self.target.display(), "append swap committed");
        Ok(())
    }

    /// Rewrite the staging file as the target's content followed by the
    /// captured output.
    fn merge_into_staging(&self) -> Result<(), ShellError> {
        let captured =
            fs::read(&self.staging).map_err(Self::failed(SwapStage::Capture, &self.staging))?;

        let mut original =
            File::open(&self.target).map_err(Self::failed(SwapStage::Copy, &self.target))?;
        let mut merged =
            File::create(&self.staging).map_err(Self::failed(SwapStage::Copy, &self.staging))?;
        io::copy(&mut original, &mut merged).map_err(Self::failed(SwapStage::Copy, &self.target))?;
        merged
            .write_all(&captured)
            .and_then(|()| merged.sync_all())
            .map_err(Self::failed(SwapStage::Copy, &self.staging))
    }

    /// Drop the captured output, leaving the target untouched.
    pub(crate) fn discard(self) {
        if let Err(err) = fs::remove_file(&self.staging) {
            warn!(staging = %self.staging.display(), %err, "can't remove staging file");
        }
    }
}
