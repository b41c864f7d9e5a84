//! Output files that become visible only when a whole run succeeds
//!
//! Each output is written to a temporary file next to its target. Dropping
//! a [`StagedOutput`] removes the temporary file, so a failing run leaves no
//! partial artifacts behind.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{CityPulseError, Result};

/// A fully written output waiting to be moved to its target path
#[derive(Debug)]
pub struct StagedOutput {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedOutput {
    /// Create an empty staged file in the target's directory.
    ///
    /// `suffix` is kept on the temporary name since some encoders pick the
    /// format from the extension.
    pub fn create(target: &Path, suffix: &str) -> Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let file = tempfile::Builder::new()
            .prefix(".citypulse-")
            .suffix(suffix)
            .tempfile_in(dir)?;
        debug!(target = %target.display(), staged = %file.path().display(), "Staged output");

        Ok(Self {
            file,
            target: target.to_path_buf(),
        })
    }

    /// Path of the temporary file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Path the output is moved to on [`persist`](Self::persist)
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Writable handle of the temporary file
    pub fn file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Move the staged file to its target and return the target path
    pub fn persist(self) -> Result<PathBuf> {
        let Self { file, target } = self;
        file.as_file().sync_all()?;
        file.persist(&target).map_err(|e| CityPulseError::Io(e.error))?;
        Ok(target)
    }
}

/// Persist every staged output, or none of them.
///
/// If a rename fails, outputs already moved by this call are removed again.
pub fn persist_all(staged: Vec<StagedOutput>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(staged.len());
    for output in staged {
        match output.persist() {
            Ok(path) => written.push(path),
            Err(e) => {
                for path in &written {
                    if let Err(remove_err) = fs::remove_file(path) {
                        warn!(path = %path.display(), "Failed to roll back output: {}", remove_err);
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn staged_with(target: &Path, content: &str) -> StagedOutput {
        let mut staged = StagedOutput::create(target, ".txt").unwrap();
        staged.file_mut().write_all(content.as_bytes()).unwrap();
        staged
    }

    #[test]
    fn test_persist_moves_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data").join("2022-03-01.csv");

        let staged = staged_with(&target, "time;Kyiv\n");
        assert!(!target.exists());
        assert_eq!(staged.target(), target.as_path());

        let written = staged.persist().unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "time;Kyiv\n");
    }

    #[test]
    fn test_dropped_output_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("animation.gif");

        let staged = staged_with(&target, "frames");
        let temp_path = staged.path().to_path_buf();
        assert!(temp_path.exists());
        drop(staged);

        assert!(!temp_path.exists());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_persist_all_rolls_back_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("export.csv");
        let blocked = dir.path().join("timeline.png");

        let first = staged_with(&export, "time;Kyiv\n");
        let second = staged_with(&blocked, "png");
        // a directory at the target makes the rename fail
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let result = persist_all(vec![first, second]);

        assert!(matches!(result, Err(CityPulseError::Io(_))));
        assert!(!export.exists());
    }

    #[test]
    fn test_persist_all_writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let targets = [dir.path().join("a.csv"), dir.path().join("media").join("b.gif")];

        let staged = targets.iter().map(|t| staged_with(t, "ok")).collect();
        let written = persist_all(staged).unwrap();

        assert_eq!(written, targets);
        assert!(targets.iter().all(|t| t.exists()));
    }
}
