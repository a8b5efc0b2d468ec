//! Batch driver: runs the pass pipeline over a list of files.
//!
//! Files are independent. A file that does not parse is skipped and
//! reported; a pass that fails on a file is aborted for that file only and
//! the text from before the pass is kept.

use crate::pass::Pass;
use crate::syntax::{KotlinParser, ParseError};
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("no input files")]
    NoInputFiles,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileOutcome should be checked for skipped files"]
pub enum FileOutcome {
    /// No pass changed anything.
    Unchanged,
    /// At least one pass changed the text. `written` is false in dry-run mode.
    Rewritten {
        original: String,
        rewritten: String,
        written: bool,
    },
    /// The file was left alone.
    Skipped { reason: String },
}

impl FileOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, FileOutcome::Skipped { .. })
    }
}

/// A pass that failed on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortedPass {
    pub pass: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub aborted: Vec<AbortedPass>,
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            FileOutcome::Unchanged => write!(f, "unchanged {}", self.path.display()),
            FileOutcome::Rewritten { written: true, .. } => {
                write!(f, "rewrote {}", self.path.display())
            }
            FileOutcome::Rewritten { written: false, .. } => {
                write!(f, "would rewrite {}", self.path.display())
            }
            FileOutcome::Skipped { reason } => {
                write!(f, "skipped {}: {}", self.path.display(), reason)
            }
        }
    }
}

/// Per-file results of one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn rewritten(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Rewritten { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().filter(|file| file.outcome.is_skipped()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.skipped() > 0
    }
}

/// Result of running every pass over one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub aborted: Vec<AbortedPass>,
}

/// Owns the parser and the ordered passes.
pub struct Driver {
    parser: KotlinParser,
    passes: Vec<Box<dyn Pass>>,
    dry_run: bool,
}

impl Driver {
    pub fn new(parser: KotlinParser, passes: Vec<Box<dyn Pass>>) -> Self {
        Self {
            parser,
            passes,
            dry_run: false,
        }
    }

    /// Compute results without writing any file.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn passes(&self) -> impl Iterator<Item = &dyn Pass> {
        self.passes.iter().map(|pass| pass.as_ref())
    }

    /// Run every pass over `source` in order.
    ///
    /// Fails only when `source` itself does not parse.
    pub fn rewrite_source(&mut self, source: &str) -> Result<Rewrite, ParseError> {
        self.parser.parse(source)?;

        let mut text = source.to_string();
        let mut aborted = Vec::new();
        for pass in &self.passes {
            match pass.run(&mut self.parser, &text) {
                Ok(next) => {
                    if next != text {
                        debug!("pass '{}' changed the text", pass.id());
                    }
                    text = next;
                }
                Err(error) => {
                    warn!("pass '{}' aborted: {}", pass.id(), error);
                    aborted.push(AbortedPass {
                        pass: pass.id().to_string(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(Rewrite { text, aborted })
    }

    /// Process one file, writing it back when it changed.
    pub fn process_file(&mut self, path: &Path) -> FileReport {
        let report = |outcome, aborted| FileReport {
            path: path.to_path_buf(),
            outcome,
            aborted,
        };

        let original = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                return report(
                    FileOutcome::Skipped {
                        reason: format!("failed to read: {error}"),
                    },
                    Vec::new(),
                )
            }
        };

        let Rewrite { text, aborted } = match self.rewrite_source(&original) {
            Ok(rewrite) => rewrite,
            Err(error) => {
                warn!("skipping {}: {}", path.display(), error);
                return report(
                    FileOutcome::Skipped {
                        reason: error.to_string(),
                    },
                    Vec::new(),
                );
            }
        };

        if text == original {
            return report(FileOutcome::Unchanged, aborted);
        }

        if !self.dry_run {
            if let Err(error) = atomic_write(path, text.as_bytes()) {
                return report(
                    FileOutcome::Skipped {
                        reason: format!("failed to write: {error}"),
                    },
                    aborted,
                );
            }
            info!("rewrote {}", path.display());
        }

        report(
            FileOutcome::Rewritten {
                original,
                rewritten: text,
                written: !self.dry_run,
            },
            aborted,
        )
    }

    /// Process every file in `paths`, in order.
    pub fn run<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<BatchReport, DriverError> {
        if paths.is_empty() {
            return Err(DriverError::NoInputFiles);
        }

        let files = paths
            .iter()
            .map(|path| self.process_file(path.as_ref()))
            .collect();
        Ok(BatchReport { files })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full new content is in place or the file is untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory keeps the rename on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::RewritePass;
    use crate::template::{Replacement, Rule};
    use tempfile::TempDir;

    fn rewrite_pass(parser: &mut KotlinParser, id: &str, pattern: &str, replacement: &str) -> Box<dyn Pass> {
        let rule = Rule::compile(parser, id, pattern, Replacement::template(replacement)).unwrap();
        Box::new(RewritePass::new(rule))
    }

    fn driver() -> Driver {
        let mut parser = KotlinParser::new().unwrap();
        let passes = vec![rewrite_pass(&mut parser, "lib-equals", "Lib.equals(#a#, #b#)", "#a# == #b#")];
        Driver::new(parser, passes)
    }

    #[test]
    fn no_input_files() {
        let paths: Vec<PathBuf> = Vec::new();
        let err = driver().run(&paths).unwrap_err();

        assert!(matches!(err, DriverError::NoInputFiles));
        assert_eq!(err.to_string(), "no input files");
    }

    #[test]
    fn aborted_pass_keeps_previous_text() {
        let mut parser = KotlinParser::new().unwrap();
        let passes = vec![
            rewrite_pass(&mut parser, "broken", "Lib.equals(#a#, #b#)", "#a# ==="),
            rewrite_pass(&mut parser, "lib-equals", "Lib.equals(#a#, #b#)", "#a# == #b#"),
        ];
        let mut driver = Driver::new(parser, passes);

        let rewrite = driver.rewrite_source("val r = Lib.equals(x, y)\n").unwrap();

        assert_eq!(rewrite.text, "val r = x == y\n");
        assert_eq!(rewrite.aborted.len(), 1);
        assert_eq!(rewrite.aborted[0].pass, "broken");
    }

    #[test]
    fn unparsable_file_is_skipped_and_batch_continues() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("Broken.kt");
        let good = dir.path().join("Good.kt");
        fs::write(&broken, "fun f( {\n").unwrap();
        fs::write(&good, "val r = Lib.equals(x, y)\n").unwrap();

        let report = driver().run(&[&broken, &good]).unwrap();

        assert_eq!(report.files.len(), 2);
        assert!(report.files[0].outcome.is_skipped());
        assert!(report.has_failures());
        assert_eq!(report.rewritten(), 1);
        assert_eq!(fs::read_to_string(&broken).unwrap(), "fun f( {\n");
        assert_eq!(fs::read_to_string(&good).unwrap(), "val r = x == y\n");
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.kt");
        fs::write(&path, "val r = Lib.equals(x, y)\n").unwrap();

        let report = driver().dry_run(true).run(&[&path]).unwrap();

        assert_eq!(
            report.files[0].outcome,
            FileOutcome::Rewritten {
                original: "val r = Lib.equals(x, y)\n".to_string(),
                rewritten: "val r = x == y\n".to_string(),
                written: false,
            }
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "val r = Lib.equals(x, y)\n"
        );
    }

    #[test]
    fn unchanged_file_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.kt");
        fs::write(&path, "val r = x == y\n").unwrap();

        let report = driver().run(&[&path]).unwrap();
        assert_eq!(report.files[0].outcome, FileOutcome::Unchanged);
        assert_eq!(report.files[0].to_string(), format!("unchanged {}", path.display()));
    }

    #[test]
    fn missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let report = driver().run(&[dir.path().join("Missing.kt")]).unwrap();
        assert!(report.files[0].outcome.is_skipped());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.kt");
        fs::write(&path, "old").unwrap();

        atomic_write(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
