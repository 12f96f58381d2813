//! Fixture discovery.
//!
//! A fixture group `NN` is a pair of directories under the fixture root:
//!
//! ```text
//! 01_input/create.doc    input document (may be empty)
//! 01_input/create.cmd    one-line command template
//! 01_output/create.doc   expected stdout (may be empty)
//! ```
//!
//! Discovery only enumerates paths. Companion files are read when a case runs,
//! so a missing `.cmd` or output file fails that case alone.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{FixturePart, HarnessError, HarnessResult};

pub const INPUT_DIR_SUFFIX: &str = "_input";
pub const OUTPUT_DIR_SUFFIX: &str = "_output";
pub const COMMAND_EXTENSION: &str = "cmd";

/// Paths of one input/command/expected-output triple sharing a base name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureTriple {
    pub group: String,
    pub name: String,
    pub input: PathBuf,
    pub command: PathBuf,
    pub expected: PathBuf,
}

/// Loaded text of a triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureContents {
    pub input: String,
    pub command: String,
    pub expected: String,
}

impl FixtureTriple {
    /// Builds the triple for an input document living in `<root>/<group>_input/`.
    pub fn from_input(root: &Path, group: &str, input: PathBuf) -> Self {
        let name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let command = input.with_extension(COMMAND_EXTENSION);
        let expected = match input.file_name() {
            Some(file_name) => root
                .join(format!("{group}{OUTPUT_DIR_SUFFIX}"))
                .join(file_name),
            None => root.join(format!("{group}{OUTPUT_DIR_SUFFIX}")),
        };
        Self {
            group: group.to_string(),
            name,
            input,
            command,
            expected,
        }
    }

    /// `group/name`, used as the case id in reports and filters.
    pub fn id(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }

    /// Reads input, command template and expected output, in that order.
    ///
    /// The first missing file aborts loading with [`HarnessError::MissingFixture`].
    pub fn load(&self) -> HarnessResult<FixtureContents> {
        let input = read_part(FixturePart::Input, &self.input)?;
        let command = read_part(FixturePart::Command, &self.command)?;
        let expected = read_part(FixturePart::Expected, &self.expected)?;
        Ok(FixtureContents {
            input,
            command,
            expected,
        })
    }
}

fn read_part(part: FixturePart, path: &Path) -> HarnessResult<String> {
    std::fs::read_to_string(path)
        .map_err(|source| HarnessError::fixture_read(part, path.to_path_buf(), source))
}

/// Enumerates fixture triples under a root directory.
#[derive(Debug)]
pub struct FixtureDiscoverer<'a> {
    root: &'a Path,
    groups: &'a [String],
    extension: &'a str,
}

impl<'a> FixtureDiscoverer<'a> {
    pub fn new(root: &'a Path, groups: &'a [String], extension: &'a str) -> Self {
        Self {
            root,
            groups,
            extension,
        }
    }

    /// Returns the sorted group names (`01`, `02`, ...) that have an input directory.
    pub fn discover_groups(&self) -> HarnessResult<Vec<String>> {
        if !self.root.is_dir() {
            return Err(HarnessError::Discovery {
                message: format!("fixture root {} is not a directory", self.root.display()),
            });
        }
        let mut groups = Vec::new();
        for entry in WalkDir::new(self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| HarnessError::Discovery {
                message: format!("failed to walk {}: {}", self.root.display(), e),
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy();
            let Some(group) = dir_name.strip_suffix(INPUT_DIR_SUFFIX) else {
                continue;
            };
            if group.is_empty() {
                continue;
            }
            if !self.groups.is_empty() && !self.groups.iter().any(|g| g == group) {
                continue;
            }
            groups.push(group.to_string());
        }
        groups.sort();

        for wanted in self.groups {
            if !groups.contains(wanted) {
                return Err(HarnessError::Discovery {
                    message: format!(
                        "group {wanted} has no {wanted}{INPUT_DIR_SUFFIX} directory under {}",
                        self.root.display()
                    ),
                });
            }
        }
        Ok(groups)
    }

    /// Enumerates every triple, sorted by group then by input path.
    pub fn discover(&self) -> HarnessResult<Vec<FixtureTriple>> {
        let mut triples = Vec::new();
        for group in self.discover_groups()? {
            let input_dir = self.root.join(format!("{group}{INPUT_DIR_SUFFIX}"));
            let mut inputs = Vec::new();
            for entry in WalkDir::new(&input_dir).min_depth(1).max_depth(1) {
                let entry = entry.map_err(|e| HarnessError::Discovery {
                    message: format!("failed to walk {}: {}", input_dir.display(), e),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if !self.has_input_extension(entry.path()) {
                    continue;
                }
                inputs.push(entry.path().to_path_buf());
            }
            inputs.sort();
            debug!(group = %group, count = inputs.len(), "discovered fixtures");
            triples.extend(
                inputs
                    .into_iter()
                    .map(|input| FixtureTriple::from_input(self.root, &group, input)),
            );
        }
        Ok(triples)
    }

    fn has_input_extension(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_paths_follow_layout() {
        let root = Path::new("/fixtures");
        let triple =
            FixtureTriple::from_input(root, "01", PathBuf::from("/fixtures/01_input/write.doc"));
        assert_eq!(triple.name, "write");
        assert_eq!(triple.command, PathBuf::from("/fixtures/01_input/write.cmd"));
        assert_eq!(triple.expected, PathBuf::from("/fixtures/01_output/write.doc"));
        assert_eq!(triple.id(), "01/write");
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let groups = Vec::new();
        let discoverer = FixtureDiscoverer::new(Path::new("/no/such/fixture/root"), &groups, "doc");
        let err = discoverer.discover().unwrap_err();
        assert_eq!(err.kind(), "discovery");
    }
}
