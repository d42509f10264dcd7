//! File reads and atomic writes shared by the commands.

use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tally_core::error::{Result, TallyError};
use tally_core::model::{RawIssue, RollupRecord};
use tally_core::report;
use tracing::debug;

/// Read an issue array as produced by `tally extract`.
pub fn read_issues(path: &Path) -> Result<Vec<RawIssue>> {
    if !path.exists() {
        return Err(TallyError::InputNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let issues: Vec<RawIssue> =
        serde_json::from_str(&text).map_err(|source| TallyError::MalformedInput {
            what: format!("issue list {}", path.display()),
            source,
        })?;
    debug!(path = %path.display(), issues = issues.len(), "read issue list");
    Ok(issues)
}

/// Read `charts` from an existing report document.
pub fn read_charts(path: &Path) -> Result<Vec<RollupRecord>> {
    if !path.exists() {
        return Err(TallyError::ChartsNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let charts = report::read_charts(&text)?;
    debug!(path = %path.display(), records = charts.len(), "read charts");
    Ok(charts)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(format!(".tmp.{}", std::process::id()));
    path.with_file_name(name)
}

/// Write `bytes` to `path` via a sibling temp file and rename, so readers
/// see either the old contents or the new ones.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let wrap = |source: io::Error| TallyError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }

    let tmp = temp_path_for(path);
    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(source) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(wrap(source));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

/// Pretty-printed JSON, written atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| TallyError::MalformedInput {
        what: format!("output for {}", path.display()),
        source,
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_inputs_map_to_specific_errors() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope.json");
        assert!(matches!(read_issues(&missing), Err(TallyError::InputNotFound(_))));
        assert!(matches!(read_charts(&missing), Err(TallyError::ChartsNotFound(_))));
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("out/report.json");
        write_atomic(&path, b"first").expect("first write");
        write_atomic(&path, b"second").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second");

        let leftovers: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("list")
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn malformed_issue_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("issues.json");
        fs::write(&path, "{\"not\": \"an array\"}").expect("write");
        assert!(matches!(read_issues(&path), Err(TallyError::MalformedInput { .. })));
    }
}
