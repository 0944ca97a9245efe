use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Fixed extension of the binary skeleton format
pub const SKELETON_EXTENSION: &str = "skel";

/// Full-scene/lobby assets, a different asset category than character sprites
const EXCLUDED_STEM_PATTERNS: [&str; 2] = ["home", "scene"];

pub fn is_skeleton_file(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension == SKELETON_EXTENSION)
        .unwrap_or(false)
}

/// Check if a path is a character skeleton worth exporting
pub fn is_character_skeleton(path: &Path) -> bool {
    if !is_skeleton_file(path) {
        return false;
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    !EXCLUDED_STEM_PATTERNS
        .iter()
        .any(|pattern| stem.contains(pattern))
}

/// Recursively collect character skeleton files, in enumeration order
pub fn find_skeleton_files(input_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(input_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| is_character_skeleton(path))
        .collect()
}
