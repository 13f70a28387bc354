//! Fragment discovery below a documentation root.

use crate::fragment::Fragment;
use crate::loader::{LoaderError, LoaderResult};
use log::{debug, info};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories below a documentation root that hold fragment scripts.
pub const FRAGMENT_DIRS: &[&str] = &["implementors", "trait.impl", "type.impl"];

const FRAGMENT_EXTENSION: &str = "js";

/// One fragment read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFragment {
    pub path: PathBuf,
    pub fragment: Fragment,
}

/// Returns every fragment script path below `root`, sorted.
///
/// Missing fragment directories are skipped; a missing root is an error.
pub fn scan_doc_root(root: &Path) -> LoaderResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(LoaderError::MissingRoot(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    for dir in FRAGMENT_DIRS {
        let base = root.join(dir);
        if !base.is_dir() {
            debug!(
                "event=scan_skip module=loader status=ok dir={}",
                base.display()
            );
            continue;
        }
        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(FRAGMENT_EXTENSION)
            {
                paths.push(path.to_path_buf());
            }
        }
    }
    paths.sort();

    info!(
        "event=scan_complete module=loader status=ok root={} fragments={}",
        root.display(),
        paths.len()
    );
    Ok(paths)
}

/// Reads and parses one fragment script.
pub fn load_fragment(path: &Path) -> LoaderResult<LoadedFragment> {
    let script = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fragment = Fragment::parse(&script).map_err(|source| LoaderError::Fragment {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LoadedFragment {
        path: path.to_path_buf(),
        fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::{load_fragment, scan_doc_root};
    use crate::loader::LoaderError;
    use std::fs;

    #[test]
    fn scan_finds_scripts_in_fragment_dirs_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("trait.impl/core/marker")).unwrap();
        fs::create_dir_all(root.join("type.impl/lurk")).unwrap();
        fs::create_dir_all(root.join("static.files")).unwrap();
        fs::write(root.join("trait.impl/core/marker/trait.Copy.js"), "x").unwrap();
        fs::write(root.join("type.impl/lurk/enum.Stub.js"), "x").unwrap();
        fs::write(root.join("type.impl/lurk/notes.txt"), "x").unwrap();
        fs::write(root.join("static.files/main.js"), "x").unwrap();

        let paths = scan_doc_root(root).expect("scan should succeed");
        let relative: Vec<_> = paths
            .iter()
            .map(|path| path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                std::path::PathBuf::from("trait.impl/core/marker/trait.Copy.js"),
                std::path::PathBuf::from("type.impl/lurk/enum.Stub.js"),
            ]
        );
    }

    #[test]
    fn scan_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_doc_root(&dir.path().join("nope")).expect_err("missing root");
        assert!(matches!(err, LoaderError::MissingRoot(_)));
    }

    #[test]
    fn load_reports_path_on_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trait.Broken.js");
        fs::write(&path, "not a fragment").unwrap();

        let err = load_fragment(&path).expect_err("invalid fragment");
        assert!(matches!(err, LoaderError::Fragment { .. }));
        assert!(err.to_string().contains("trait.Broken.js"));
    }
}
