//! Filesystem operations module.
//!
//! This module provides low-level operations for:
//! - Copying a single file (overwriting, with modification time preserved)
//! - Creating parent directories on demand
//! - Planning and performing bottom-up removal of a directory tree

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::EngineError;

/// Copy a file from source to destination, overwriting any existing file.
///
/// # Returns
/// Number of bytes copied
///
/// # Errors
/// `EngineError::SourceMissing` if the source does not exist, otherwise
/// `EngineError::CopyIo` for any read, write, or directory creation failure.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let copy_err = |e: io::Error| EngineError::CopyIo {
        source_path: src.to_path_buf(),
        dest_path: dst.to_path_buf(),
        source: e,
    };

    let mut src_file = match fs::File::open(src) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EngineError::SourceMissing {
                path: src.to_path_buf(),
            });
        }
        Err(e) => return Err(copy_err(e)),
    };

    let src_mtime = src_file.metadata().map_err(copy_err)?.modified().ok();

    ensure_parent_dir_exists(dst).map_err(copy_err)?;

    let mut dst_file = fs::File::create(dst).map_err(copy_err)?;
    let bytes_copied = io::copy(&mut src_file, &mut dst_file).map_err(copy_err)?;
    drop(dst_file);

    // Preserve modification time if available
    if let Some(mtime) = src_mtime {
        let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime));
    }

    Ok(bytes_copied)
}

/// Ensure the parent directory of a path exists, creating it if necessary.
pub fn ensure_parent_dir_exists(path: &Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    // Skip if parent is empty path (relative root)
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    match fs::metadata(parent) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Parent path exists but is not a directory",
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(parent),
        Err(e) => Err(e),
    }
}

/// One entry scheduled for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Removal plan for everything below a root, children before their directory.
#[derive(Debug, Default)]
pub struct RemovalPlan {
    pub entries: Vec<RemovalEntry>,
    /// Entries that could not be read while walking
    pub walk_errors: Vec<walkdir::Error>,
}

/// Walk `root` and list its contents bottom-up. The root itself is not included.
///
/// Entries within a directory are sorted by name so plans are reproducible.
/// Symlinks are not followed; a link to a directory is removed as a file.
pub fn plan_removal(root: &Path) -> RemovalPlan {
    let mut plan = RemovalPlan::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        match entry {
            Ok(entry) => plan.entries.push(RemovalEntry {
                is_dir: entry.file_type().is_dir(),
                path: entry.into_path(),
            }),
            Err(e) => plan.walk_errors.push(e),
        }
    }

    plan
}

/// Remove a single file or empty directory.
pub fn remove_entry(entry: &RemovalEntry) -> Result<(), EngineError> {
    let result = if entry.is_dir {
        fs::remove_dir(&entry.path)
    } else {
        fs::remove_file(&entry.path)
    };
    result.map_err(|e| EngineError::DeleteIo {
        path: entry.path.clone(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_file_overwrites_destination() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let dst_file = temp_dir.path().join("dest.txt");

        fs::write(&src_file, b"test content").expect("Failed to write source");
        fs::write(&dst_file, b"old and much longer content").expect("Failed to write dest");

        let bytes = copy_file(&src_file, &dst_file).expect("Failed to copy");
        assert_eq!(bytes, 12);

        let content = fs::read(&dst_file).expect("Failed to read dest");
        assert_eq!(content, b"test content");
    }

    #[test]
    fn test_copy_file_missing_source() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = copy_file(
            &temp_dir.path().join("nope.jpg"),
            &temp_dir.path().join("out.jpg"),
        );
        assert!(matches!(result, Err(EngineError::SourceMissing { .. })));
        assert!(!temp_dir.path().join("out.jpg").exists());
    }

    #[test]
    fn test_copy_file_creates_parent() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("a.bin");
        fs::write(&src_file, [0u8, 1, 2, 255]).expect("Failed to write source");

        let dst_file = temp_dir.path().join("nested").join("deeper").join("a.bin");
        copy_file(&src_file, &dst_file).expect("Failed to copy");
        assert_eq!(fs::read(&dst_file).expect("Failed to read dest"), [0u8, 1, 2, 255]);
    }

    #[test]
    fn test_copy_file_write_failure_is_copy_io() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("a.txt");
        fs::write(&src_file, b"x").expect("Failed to write source");

        // Destination path is an existing directory, so creating the file fails.
        let dst = temp_dir.path().join("blocked");
        fs::create_dir(&dst).expect("Failed to create dir");

        let result = copy_file(&src_file, &dst);
        assert!(matches!(result, Err(EngineError::CopyIo { .. })));
    }

    #[test]
    fn test_ensure_parent_dir_exists() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("subdir").join("file.txt");

        ensure_parent_dir_exists(&path).expect("Failed to create parent");
        assert!(path.parent().unwrap().exists());
    }

    #[test]
    fn test_plan_removal_is_bottom_up() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a").join("b")).expect("Failed to create dirs");
        fs::write(root.join("a").join("b").join("f.txt"), b"1").expect("Failed to write");
        fs::write(root.join("a").join("g.txt"), b"2").expect("Failed to write");
        fs::write(root.join("top.txt"), b"3").expect("Failed to write");

        let plan = plan_removal(root);
        assert!(plan.walk_errors.is_empty());
        assert_eq!(plan.entries.len(), 5);

        let position = |p: PathBuf| {
            plan.entries
                .iter()
                .position(|e| e.path == p)
                .expect("entry in plan")
        };
        let a = position(root.join("a"));
        let b = position(root.join("a").join("b"));
        let f = position(root.join("a").join("b").join("f.txt"));
        let g = position(root.join("a").join("g.txt"));

        assert!(f < b);
        assert!(b < a);
        assert!(g < a);
        assert!(plan.entries.iter().all(|e| e.path != root));
    }

    #[test]
    fn test_remove_entry_reports_non_empty_dir() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("full");
        fs::create_dir(&dir).expect("Failed to create dir");
        fs::write(dir.join("x"), b"x").expect("Failed to write");

        let result = remove_entry(&RemovalEntry {
            path: dir.clone(),
            is_dir: true,
        });
        assert!(matches!(result, Err(EngineError::DeleteIo { .. })));
        assert!(dir.exists());
    }
}
