use std::error::Error;
use std::path::Path;

/// Axis-aligned bounding box of a posed skeleton, in skeleton units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Posed skeleton owned for the duration of a single asset export
pub trait PoseGraph {
    fn set_position(&mut self, x: f32, y: f32);
    fn update_world_transform(&mut self);

    /// Bounding box of the current pose
    fn bounds(&mut self) -> Bounds;

    /// Animation names in the asset's definition order
    fn animation_names(&self) -> Vec<String>;

    /// Set the single active clip on track 0, looping off
    fn set_animation(&mut self, name: &str) -> Result<(), Box<dyn Error>>;

    /// Advance the pose clock and re-pose the skeleton
    fn update(&mut self, delta: f32);
}

/// Offscreen surface the posed mesh is rasterized onto
pub trait RenderSurface {
    fn clear_transparent(&mut self);

    /// Encode and write the surface, encoder selected by file extension
    fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn Error>>;
}

/// External animation runtime + rasterizer boundary
pub trait SkeletonRuntime {
    type Pose: PoseGraph;
    type Surface: RenderSurface;

    fn load_pose(
        &self,
        skel_path: &Path,
        atlas_path: &Path,
        scale: f32,
    ) -> Result<Self::Pose, Box<dyn Error>>;

    fn create_surface(&self, width: u32, height: u32) -> Result<Self::Surface, Box<dyn Error>>;

    /// Rasterize the current pose onto the surface with alpha blending
    fn draw(&self, pose: &mut Self::Pose, surface: &mut Self::Surface);
}
