//! Persistence of the rendered report.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::report::{self, RenderedReport, STYLESHEET_FILE_NAME};

/// The report document could not be persisted.
#[derive(Error, Debug)]
#[error("writing report {}: {source}", path.display())]
pub struct ArtifactWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Destination for rendered reports.
pub trait ArtifactSink {
    /// Store the document in `dir` under the well-known report file name,
    /// with its stylesheet alongside. Returns the document's path.
    ///
    /// Only a failure to store the document is an error.
    fn write_report(&self, dir: &Path, rendered: &RenderedReport)
        -> Result<PathBuf, ArtifactWriteError>;
}

/// Writes reports to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactSink;

impl ArtifactSink for FsArtifactSink {
    fn write_report(
        &self,
        dir: &Path,
        rendered: &RenderedReport,
    ) -> Result<PathBuf, ArtifactWriteError> {
        fs::create_dir_all(dir).map_err(|source| ArtifactWriteError {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = report::report_path(dir);
        fs::write(&path, &rendered.document).map_err(|source| ArtifactWriteError {
            path: path.clone(),
            source,
        })?;

        let css_path = dir.join(STYLESHEET_FILE_NAME);
        if let Err(e) = fs::write(&css_path, rendered.stylesheet) {
            tracing::warn!(path = %css_path.display(), "error copying report stylesheet: {}", e);
        }

        tracing::debug!(path = %path.display(), "report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ViolationSet;
    use tempfile::TempDir;

    #[test]
    fn test_writes_document_and_stylesheet() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("build/reports/lintgate");
        let rendered = report::render(&ViolationSet::new());

        let path = FsArtifactSink.write_report(&dir, &rendered).unwrap();

        assert_eq!(path, dir.join("lintgate.html"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), rendered.document);
        assert_eq!(
            std::fs::read_to_string(dir.join("lintgate.css")).unwrap(),
            rendered.stylesheet
        );
    }

    #[test]
    fn test_overwrites_previous_report() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("lintgate.html"), "old").unwrap();

        let rendered = report::render(&ViolationSet::new());
        FsArtifactSink.write_report(temp.path(), &rendered).unwrap();

        let content = std::fs::read_to_string(temp.path().join("lintgate.html")).unwrap();
        assert_ne!(content, "old");
    }

    #[test]
    fn test_unwritable_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let rendered = report::render(&ViolationSet::new());
        let err = FsArtifactSink
            .write_report(&blocker.join("reports"), &rendered)
            .unwrap_err();

        assert_eq!(err.path, blocker.join("reports"));
    }

    #[test]
    fn test_stylesheet_failure_is_tolerated() {
        let temp = TempDir::new().unwrap();
        // A directory where the stylesheet should go makes its write fail.
        std::fs::create_dir(temp.path().join("lintgate.css")).unwrap();

        let rendered = report::render(&ViolationSet::new());
        let path = FsArtifactSink.write_report(temp.path(), &rendered).unwrap();

        assert!(path.is_file());
    }
}
