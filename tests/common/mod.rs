//! Shared helpers for building fixture trees in temporary directories.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use semcon_harness::HarnessConfig;
use tempfile::TempDir;

/// A fixture tree rooted in a temporary directory.
pub struct FixtureTree {
    pub dir: TempDir,
}

impl FixtureTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a full triple: `<group>_input/<name>.doc`, `.cmd`, and `<group>_output/<name>.doc`.
    pub fn triple(&self, group: &str, name: &str, input: &str, command: &str, expected: &str) -> &Self {
        self.input(group, name, input);
        self.command(group, name, command);
        self.expected(group, name, expected);
        self
    }

    pub fn input(&self, group: &str, name: &str, content: &str) -> PathBuf {
        self.write(&format!("{group}_input/{name}.doc"), content)
    }

    pub fn command(&self, group: &str, name: &str, content: &str) -> PathBuf {
        self.write(&format!("{group}_input/{name}.cmd"), content)
    }

    pub fn expected(&self, group: &str, name: &str, content: &str) -> PathBuf {
        self.write(&format!("{group}_output/{name}.doc"), content)
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(&path, content).expect("write fixture");
        path
    }

    /// Default config pointed at this tree, ignoring the process environment.
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            fixture_root: self.root().to_path_buf(),
            use_colors: false,
            ..HarnessConfig::default()
        }
    }
}
