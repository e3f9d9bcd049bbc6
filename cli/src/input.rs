//! Raw name list sources.
//!
//! The engine only consumes raw name strings. This module produces them from
//! a newline-delimited text file, or from a directory listing (file names
//! carrying the job extension, with the extension stripped).

use std::fs;
use std::path::Path;

use multicopy_engine::{EngineError, EngineResult};

/// Read raw names from `path`.
///
/// # Errors
/// `EngineError::InputRead` if the file or directory cannot be read.
pub fn read_names(path: &Path, extension: &str) -> EngineResult<Vec<String>> {
    let read_err = |source| EngineError::InputRead {
        path: path.to_path_buf(),
        source,
    };

    if path.is_dir() {
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if !entry.file_type().map_err(read_err)?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = file_name.strip_suffix(extension) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        return Ok(names);
    }

    let content = fs::read_to_string(path).map_err(read_err)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_lines_from_text_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let list = temp_dir.path().join("list.txt");
        fs::write(&list, "\u{feff}1\r\n2\n\n1\n").expect("Failed to write list");

        let names = read_names(&list, ".jpg").expect("Failed to read list");
        assert_eq!(names, vec!["1", "2", "", "1"]);
    }

    #[test]
    fn test_reads_directory_listing() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("b.jpg"), b"").expect("Failed to write");
        fs::write(temp_dir.path().join("a.jpg"), b"").expect("Failed to write");
        fs::write(temp_dir.path().join("notes.txt"), b"").expect("Failed to write");
        fs::create_dir(temp_dir.path().join("sub.jpg")).expect("Failed to create dir");

        let names = read_names(temp_dir.path(), ".jpg").expect("Failed to read listing");
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_list_is_input_error() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = read_names(&temp_dir.path().join("missing.txt"), ".jpg");
        assert!(matches!(result, Err(EngineError::InputRead { .. })));
    }
}
