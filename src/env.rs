use std::collections::HashMap;
use std::env as stdenv;
use std::io;
use std::path::{Path, PathBuf};

/// User-level view of the process environment used by the interpreter.
///
/// Variables can be overridden in `vars`; lookups fall back to the real
/// process environment. The working directory is deliberately not stored
/// here: it is always read from and written to the OS, so builtins and
/// launched programs can never disagree about it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Overrides on top of the process environment, also passed to children.
    pub vars: HashMap<String, String>,
}

impl Environment {
    /// Environment with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The working directory as reported by the OS.
    pub fn current_dir(&self) -> io::Result<PathBuf> {
        stdenv::current_dir()
    }

    /// Change the process-wide working directory.
    pub fn set_current_dir(&self, path: &Path) -> io::Result<()> {
        stdenv::set_current_dir(path)
    }
}
