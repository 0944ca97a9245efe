/// Names that are always treated as animated, no matter what else matches
const ANIMATED_PATTERNS: [&str; 2] = ["eyeclose", "eye_close"];

/// Check if an animation should be exported as a single static pose
///
/// Heuristic, might misclassify on some assets: eye-close clips are always
/// animated, and an idle clip is assumed to loop unless it is the asset's
/// only animation. Kept as-is for compatibility with existing output.
pub fn is_static_animation(animation_name: &str, total_animation_count: usize) -> bool {
    let name = animation_name.to_lowercase();

    if ANIMATED_PATTERNS.iter().any(|pattern| name.contains(pattern)) {
        return false;
    }

    if name.contains("idle") {
        return total_animation_count <= 1;
    }

    true
}
