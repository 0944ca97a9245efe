use crate::runtime::{Bounds, PoseGraph, RenderSurface, SkeletonRuntime};
use image::RgbaImage;
use log::warn;
use rusty_spine::controller::{SkeletonController, SkeletonRenderable};
use rusty_spine::{AnimationStateData, Atlas, SkeletonBinary};
use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Once};
use tiny_skia::{
    Color, FillRule, FilterQuality, IntSize, Paint, Path as SkiaPath, PathBuilder, Pattern, Pixmap,
    SpreadMode, Transform,
};

static TEXTURE_CALLBACKS: Once = Once::new();

/// Atlas page texture attached to the page's renderer object by the
/// create-texture callback, read back during drawing
struct SpineTexture {
    pixmap: Option<Pixmap>,
}

fn install_texture_callbacks() {
    TEXTURE_CALLBACKS.call_once(|| {
        rusty_spine::extension::set_create_texture_cb(|atlas_page, path| {
            let pixmap = match load_page_texture(path) {
                Ok(pixmap) => Some(pixmap),
                Err(err) => {
                    warn!("failed to load atlas page '{path}': {err}");
                    None
                }
            };

            atlas_page.renderer_object().set(SpineTexture { pixmap });
        });

        rusty_spine::extension::set_dispose_texture_cb(|atlas_page| unsafe {
            atlas_page.renderer_object().dispose::<SpineTexture>();
        });
    });
}

/// Decode an atlas page image into a premultiplied pixmap
fn load_page_texture(path: &str) -> Result<Pixmap, Box<dyn Error>> {
    let image = image::open(path)?.into_rgba8();
    let (width, height) = image.dimensions();
    let mut data = image.into_raw();

    for pixel in data.chunks_exact_mut(4) {
        let alpha = pixel[3] as u16;
        pixel[0] = ((pixel[0] as u16 * alpha) / 255) as u8;
        pixel[1] = ((pixel[1] as u16 * alpha) / 255) as u8;
        pixel[2] = ((pixel[2] as u16 * alpha) / 255) as u8;
    }

    let size = IntSize::from_wh(width, height).ok_or("atlas page has zero size")?;
    Pixmap::from_vec(data, size).ok_or_else(|| "atlas page does not fit in a pixmap".into())
}

/// Runtime backed by rusty_spine (official spine-c wrapper) for pose data
/// and tiny-skia for rasterization
pub struct SpineRuntime;

impl SpineRuntime {
    pub fn new() -> SpineRuntime {
        install_texture_callbacks();
        SpineRuntime
    }
}

impl Default for SpineRuntime {
    fn default() -> SpineRuntime {
        SpineRuntime::new()
    }
}

pub struct SpinePose {
    controller: SkeletonController,
    animations: Vec<String>,
    // Keeps page textures alive for the controller's lifetime
    _atlas: Arc<Atlas>,
}

pub struct SkiaSurface {
    pixmap: Pixmap,
}

impl SkeletonRuntime for SpineRuntime {
    type Pose = SpinePose;
    type Surface = SkiaSurface;

    fn load_pose(
        &self,
        skel_path: &Path,
        atlas_path: &Path,
        scale: f32,
    ) -> Result<SpinePose, Box<dyn Error>> {
        let atlas = Arc::new(Atlas::new_from_file(atlas_path)?);

        let binary = SkeletonBinary::new(atlas.clone());
        let skeleton_data = Arc::new(binary.read_skeleton_data_file(skel_path)?);

        let animations = skeleton_data
            .animations()
            .map(|animation| animation.name().to_owned())
            .collect();

        let animation_state_data = Arc::new(AnimationStateData::new(skeleton_data.clone()));
        let mut controller = SkeletonController::new(skeleton_data, animation_state_data);
        controller.skeleton.set_scale_x(scale);
        controller.skeleton.set_scale_y(scale);

        Ok(SpinePose {
            controller,
            animations,
            _atlas: atlas,
        })
    }

    fn create_surface(&self, width: u32, height: u32) -> Result<SkiaSurface, Box<dyn Error>> {
        let pixmap = Pixmap::new(width, height).ok_or("invalid surface dimensions")?;
        Ok(SkiaSurface { pixmap })
    }

    fn draw(&self, pose: &mut SpinePose, surface: &mut SkiaSurface) {
        let surface_height = surface.pixmap.height() as f32;

        for renderable in pose.controller.renderables() {
            let Some(renderer_object) = renderable.attachment_renderer_object else {
                continue;
            };

            // Set by the create-texture callback in install_texture_callbacks
            let texture = unsafe { &*(renderer_object as *const SpineTexture) };
            let Some(page) = texture.pixmap.as_ref() else {
                continue;
            };

            draw_mesh(&mut surface.pixmap, &renderable, page, surface_height);
        }
    }
}

impl PoseGraph for SpinePose {
    fn set_position(&mut self, x: f32, y: f32) {
        self.controller.skeleton.set_x(x);
        self.controller.skeleton.set_y(y);
    }

    fn update_world_transform(&mut self) {
        self.controller.skeleton.update_world_transform();
    }

    fn bounds(&mut self) -> Bounds {
        let mut min = (f32::MAX, f32::MAX);
        let mut max = (f32::MIN, f32::MIN);
        let mut any = false;

        for renderable in self.controller.renderables() {
            for [x, y] in renderable.vertices {
                min = (min.0.min(x), min.1.min(y));
                max = (max.0.max(x), max.1.max(y));
                any = true;
            }
        }

        if !any {
            return Bounds::default();
        }

        Bounds {
            x: min.0,
            y: min.1,
            width: max.0 - min.0,
            height: max.1 - min.1,
        }
    }

    fn animation_names(&self) -> Vec<String> {
        self.animations.clone()
    }

    fn set_animation(&mut self, name: &str) -> Result<(), Box<dyn Error>> {
        self.controller
            .animation_state
            .set_animation_by_name(0, name, false)?;
        Ok(())
    }

    fn update(&mut self, delta: f32) {
        self.controller.update(delta);
    }
}

impl RenderSurface for SkiaSurface {
    fn clear_transparent(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let width = self.pixmap.width();
        let height = self.pixmap.height();

        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for pixel in self.pixmap.pixels() {
            let color = pixel.demultiply();
            data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }

        let image =
            RgbaImage::from_raw(width, height, data).ok_or("surface buffer size mismatch")?;

        // Encoder is picked from the file extension; unknown extensions fail here
        image.save(path)?;
        Ok(())
    }
}

/// Fill one renderable's mesh triangles, flipping from y-up skeleton space
/// into y-down image space
fn draw_mesh(
    target: &mut Pixmap,
    renderable: &SkeletonRenderable,
    page: &Pixmap,
    surface_height: f32,
) {
    let texture_width = page.width() as f32;
    let texture_height = page.height() as f32;
    let blend = blend_mode(renderable.blend_mode);
    let opacity = renderable.color.a.clamp(0.0, 1.0);

    for triangle in renderable.indices.chunks_exact(3) {
        let mut src = [(0.0f32, 0.0f32); 3];
        let mut dst = [(0.0f32, 0.0f32); 3];

        for (corner, index) in triangle.iter().enumerate() {
            let index = *index as usize;
            let [u, v] = renderable.uvs[index];
            let [x, y] = renderable.vertices[index];
            src[corner] = (u * texture_width, v * texture_height);
            dst[corner] = (x, surface_height - y);
        }

        let Some(transform) = triangle_transform(src, dst) else {
            continue;
        };
        let Some(path) = triangle_path(dst) else {
            continue;
        };

        let mut paint = Paint::default();
        // Adjacent mesh triangles share edges; anti-aliasing would leave seams
        paint.anti_alias = false;
        paint.blend_mode = blend;
        paint.shader = Pattern::new(
            page.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            opacity,
            transform,
        );

        target.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

fn blend_mode(mode: rusty_spine::BlendMode) -> tiny_skia::BlendMode {
    match mode {
        rusty_spine::BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
        rusty_spine::BlendMode::Additive => tiny_skia::BlendMode::Plus,
        rusty_spine::BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
        rusty_spine::BlendMode::Screen => tiny_skia::BlendMode::Screen,
    }
}

fn triangle_path(dst: [(f32, f32); 3]) -> Option<SkiaPath> {
    let mut builder = PathBuilder::new();
    builder.move_to(dst[0].0, dst[0].1);
    builder.line_to(dst[1].0, dst[1].1);
    builder.line_to(dst[2].0, dst[2].1);
    builder.close();
    builder.finish()
}

/// Affine transform mapping texture pixels onto a screen triangle, solved
/// with Cramer's rule; None for degenerate triangles
fn triangle_transform(src: [(f32, f32); 3], dst: [(f32, f32); 3]) -> Option<Transform> {
    let [(u0, v0), (u1, v1), (u2, v2)] = src;

    let det = u0 * (v1 - v2) - v0 * (u1 - u2) + (u1 * v2 - u2 * v1);
    if det.abs() <= f32::EPSILON {
        return None;
    }

    let solve = |t0: f32, t1: f32, t2: f32| {
        let a = (t0 * (v1 - v2) - v0 * (t1 - t2) + (t1 * v2 - t2 * v1)) / det;
        let b = (u0 * (t1 - t2) - t0 * (u1 - u2) + (u1 * t2 - u2 * t1)) / det;
        let c = (u0 * (v1 * t2 - v2 * t1) - v0 * (u1 * t2 - u2 * t1) + t0 * (u1 * v2 - u2 * v1))
            / det;
        (a, b, c)
    };

    let (sx, kx, tx) = solve(dst[0].0, dst[1].0, dst[2].0);
    let (ky, sy, ty) = solve(dst[0].1, dst[1].1, dst[2].1);

    Some(Transform::from_row(sx, ky, kx, sy, tx, ty))
}
