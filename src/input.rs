// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Turning user selections into an ordered file list

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{NamifyError, Result};

/// Files to hand to a job, plus the directory reported in outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub files: Vec<PathBuf>,
    pub directory: String,
}

/// Build a selection from command-line paths.
///
/// A single directory is listed (regular files only, not recursive,
/// sorted by name). Anything else is taken as an explicit file list in
/// the order given, reported under the parent of the first file.
pub fn collect_selection(paths: &[PathBuf]) -> Result<Selection> {
    match paths {
        [] => Err(NamifyError::NoInput(
            "Please select a directory or files".to_string(),
        )),
        [dir] if dir.is_dir() => Ok(Selection {
            files: list_directory(dir)?,
            directory: dir.to_string_lossy().into_owned(),
        }),
        files => Ok(Selection {
            files: files.to_vec(),
            directory: parent_of(&files[0]),
        }),
    }
}

/// Regular files directly inside `dir`, sorted by name
pub fn list_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    debug!("Listed {} file(s) in {:?}", files.len(), dir);
    Ok(files)
}

fn parent_of(path: &Path) -> String {
    path.parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_is_rejected() {
        assert!(matches!(collect_selection(&[]), Err(NamifyError::NoInput(_))));
    }

    #[test]
    fn test_directory_lists_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let selection = collect_selection(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            selection.files,
            vec![dir.path().join("a.jpg"), dir.path().join("b.png")]
        );
        assert_eq!(selection.directory, dir.path().to_string_lossy());
    }

    #[test]
    fn test_explicit_files_keep_order() {
        let files = vec![
            PathBuf::from("/photos/z.png"),
            PathBuf::from("/other/a.png"),
        ];
        let selection = collect_selection(&files).unwrap();
        assert_eq!(selection.files, files);
        assert_eq!(selection.directory, "/photos");
    }

    #[test]
    fn test_missing_directory_is_a_file_list() {
        let selection = collect_selection(&[PathBuf::from("/nope/shot.png")]).unwrap();
        assert_eq!(selection.files.len(), 1);
        assert_eq!(selection.directory, "/nope");
    }
}
