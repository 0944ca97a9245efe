use std::path::{Path, PathBuf};

/// Companion atlas files share the skeleton's directory and stem
pub const ATLAS_EXTENSION: &str = "atlas";

const CHARACTER_SUFFIX: &str = "_spr";
const FRAME_INDEX_WIDTH: usize = 6;

/// Get character id from a skeleton file path
/// e.g. "chars/Character_Spr.skel" -> "character"
pub fn character_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match stem.find(CHARACTER_SUFFIX) {
        Some(pos) => stem[..pos].to_owned(),
        None => stem,
    }
}

/// Generate output file name
/// e.g. "character--animation.png" or, for a frame of an animated clip,
/// "character--animation-000001.png"
pub fn output_file_name(
    base_id: &str,
    animation_name: &str,
    extension: &str,
    frame_index: Option<u32>,
) -> String {
    match frame_index {
        Some(index) => format!(
            "{base_id}--{animation_name}-{index:0width$}.{extension}",
            width = FRAME_INDEX_WIDTH
        ),
        None => format!("{base_id}--{animation_name}.{extension}"),
    }
}

/// Get companion atlas path for a skeleton file
pub fn atlas_path(skel_path: &Path) -> PathBuf {
    skel_path.with_extension(ATLAS_EXTENSION)
}
