//! Building groups from a directory tree.
//!
//! A recursive walk turns each directory holding at least one supported
//! image into one or more [`Group`]s. The traversal is ordered lexically
//! by directory path, making group identity stable across runs so a prior
//! session can be resumed against a fresh scan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;
use walkdir::WalkDir;

use super::Group;

/// Image filename extensions the scanner accepts, matched
/// case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// How directories are partitioned into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    /// One directory = one group.
    Folder,
    /// Each directory's sorted image list is split into consecutive
    /// windows of this size; the final partial window still forms its own
    /// group. A window never spans two directories.
    FixedSize(usize),
}

/// Errors raised while scanning the image tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No supported images anywhere under the root. Fatal: there is
    /// nothing to process.
    #[error(
        "no images found in the provided directory (supported extensions: {})",
        SUPPORTED_EXTENSIONS.join(", ")
    )]
    EmptyCollection,

    /// Fixed-size mode with a zero window size.
    #[error("group size must be at least 1")]
    InvalidGroupSize,

    /// The walk itself failed (missing root, permission error).
    #[error("failed to scan image directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Walk `root` and build the ordered group list for `mode`.
pub fn scan_groups(root: &Path, mode: GroupingMode) -> Result<Vec<Group>, ScanError> {
    if let GroupingMode::FixedSize(0) = mode {
        return Err(ScanError::InvalidGroupSize);
    }

    // directory -> sorted image names; BTreeMap ordering doubles as the
    // deterministic traversal order
    let mut by_dir: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_supported_image(entry.path()) {
            continue;
        }
        let Some(parent) = entry.path().parent() else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        by_dir.entry(parent.to_path_buf()).or_default().push(name);
    }

    let mut groups = Vec::new();
    for (dir, mut names) in by_dir {
        names.sort();
        let relative_dir = dir.strip_prefix(root).unwrap_or(&dir).to_path_buf();
        let base_id = group_id(&relative_dir);

        match mode {
            GroupingMode::Folder => {
                groups.push(Group::new(base_id, dir, relative_dir, names));
            }
            GroupingMode::FixedSize(size) => {
                for (counter, window) in names.chunks(size).enumerate() {
                    groups.push(Group::new(
                        format!("{}#{}", base_id, counter + 1),
                        dir.clone(),
                        relative_dir.clone(),
                        window.to_vec(),
                    ));
                }
            }
        }
    }

    if groups.is_empty() {
        return Err(ScanError::EmptyCollection);
    }
    debug!("scanned {} group(s) under {}", groups.len(), root.display());
    Ok(groups)
}

/// Stable group identity: `root` plus the relative directory with forward
/// slashes, regardless of platform.
fn group_id(relative_dir: &Path) -> String {
    let mut id = String::from("root");
    for component in relative_dir.components() {
        id.push('/');
        id.push_str(&component.as_os_str().to_string_lossy());
    }
    id
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_folder_mode_one_group_per_directory() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("A/b.jpg"));
        touch(&root.path().join("A/a.jpg"));
        touch(&root.path().join("A/c.jpg"));
        touch(&root.path().join("B/d.jpg"));

        let groups = scan_groups(root.path(), GroupingMode::Folder).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, "root/A");
        assert_eq!(groups[0].filenames, ["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(groups[1].id, "root/B");
        assert_eq!(groups[1].filenames, ["d.jpg"]);
    }

    #[test]
    fn test_root_level_images_form_root_group() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("x.png"));
        let groups = scan_groups(root.path(), GroupingMode::Folder).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "root");
        assert_eq!(groups[0].relative_dir, Path::new(""));
    }

    #[test]
    fn test_directories_without_images_emit_no_group() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("A/a.jpg"));
        fs::create_dir_all(root.path().join("empty/nested")).unwrap();
        touch(&root.path().join("docs/readme.txt"));

        let groups = scan_groups(root.path(), GroupingMode::Folder).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "root/A");
    }

    #[test]
    fn test_extensions_case_insensitive() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("A/a.JPG"));
        touch(&root.path().join("A/b.Png"));
        touch(&root.path().join("A/c.TIFF"));
        touch(&root.path().join("A/skip.gif"));

        let groups = scan_groups(root.path(), GroupingMode::Folder).unwrap();
        assert_eq!(groups[0].filenames, ["a.JPG", "b.Png", "c.TIFF"]);
    }

    #[test]
    fn test_fixed_size_windows() {
        let root = tempfile::tempdir().unwrap();
        for name in ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"] {
            touch(&root.path().join("A").join(name));
        }

        let groups = scan_groups(root.path(), GroupingMode::FixedSize(2)).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].id, "root/A#1");
        assert_eq!(groups[0].filenames, ["1.jpg", "2.jpg"]);
        assert_eq!(groups[1].id, "root/A#2");
        assert_eq!(groups[1].filenames, ["3.jpg", "4.jpg"]);
        // The final partial window is still its own group
        assert_eq!(groups[2].id, "root/A#3");
        assert_eq!(groups[2].filenames, ["5.jpg"]);
    }

    #[test]
    fn test_fixed_size_windows_never_span_directories() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("A/a.jpg"));
        touch(&root.path().join("B/b.jpg"));

        let groups = scan_groups(root.path(), GroupingMode::FixedSize(2)).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].filenames, ["a.jpg"]);
        assert_eq!(groups[1].filenames, ["b.jpg"]);
    }

    #[test]
    fn test_zero_group_size_rejected() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("a.jpg"));
        assert!(matches!(
            scan_groups(root.path(), GroupingMode::FixedSize(0)),
            Err(ScanError::InvalidGroupSize)
        ));
    }

    #[test]
    fn test_empty_tree_is_empty_collection() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_groups(root.path(), GroupingMode::Folder),
            Err(ScanError::EmptyCollection)
        ));
    }

    #[test]
    fn test_scan_order_stable_across_runs() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("B/b.jpg"));
        touch(&root.path().join("A/a.jpg"));
        touch(&root.path().join("A/sub/s.jpg"));

        let first = scan_groups(root.path(), GroupingMode::Folder).unwrap();
        let second = scan_groups(root.path(), GroupingMode::Folder).unwrap();
        let ids: Vec<_> = first.iter().map(|g| g.id.clone()).collect();
        assert_eq!(ids, ["root/A", "root/A/sub", "root/B"]);
        assert_eq!(
            ids,
            second.iter().map(|g| g.id.clone()).collect::<Vec<_>>()
        );
    }
}
