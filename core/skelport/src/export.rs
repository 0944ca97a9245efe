use crate::classify::is_static_animation;
use crate::discover::find_skeleton_files;
use crate::naming;
use crate::runtime::{PoseGraph, RenderSurface, SkeletonRuntime};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

/// Padding around the rest-pose bounding box, in skeleton units
pub const EDGE_MARGIN: f32 = 20.0;

#[derive(Debug, ThisError)]
pub enum ExportError {
    #[error("failed to load skel {path:?}: {message}")]
    SkeletonLoad {
        path: PathBuf,
        message: String,
    },
    #[error("failed to create render surface (width: {width}, height: {height})")]
    SurfaceAllocation {
        width: u32,
        height: u32,
    },
    #[error("failed to set animation '{name}': {message}")]
    Animation {
        name: String,
        message: String,
    },
    #[error("failed to write image {path:?}: {message}")]
    ImageWrite {
        path: PathBuf,
        message: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Batch exporter writing one image per static animation into
/// a per-character subdirectory of `dest_dir`
pub struct SpriteExporter<R: SkeletonRuntime> {
    runtime: R,
    dest_dir: PathBuf,
    file_extension: String,
    scale: f32,
}

impl<R: SkeletonRuntime> SpriteExporter<R> {
    pub fn new(runtime: R, dest_dir: &Path, file_extension: &str, scale: f32) -> SpriteExporter<R> {
        SpriteExporter {
            runtime,
            dest_dir: dest_dir.to_path_buf(),
            file_extension: file_extension.to_owned(),
            scale,
        }
    }

    /// Walk `input_dir` and export every character skeleton found
    ///
    /// Per-asset failures are logged and the run continues; only output-root
    /// creation can fail the whole run.
    pub fn export_directory(&self, input_dir: &Path) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dest_dir)?;

        let skeletons = find_skeleton_files(input_dir);
        info!("found {} character skeleton(s) in {:?}", skeletons.len(), input_dir);

        for skel_path in &skeletons {
            if let Err(err) = self.export_asset(skel_path) {
                error!("{err}");
            }
        }

        Ok(())
    }

    /// Export every static animation of a single skeleton + atlas pair
    pub fn export_asset(&self, skel_path: &Path) -> Result<(), ExportError> {
        let atlas_path = naming::atlas_path(skel_path);

        let mut pose = self
            .runtime
            .load_pose(skel_path, &atlas_path, self.scale)
            .map_err(|err| ExportError::SkeletonLoad {
                path: skel_path.to_path_buf(),
                message: err.to_string(),
            })?;

        // Rest-pose bounding box with the skeleton at the origin
        pose.set_position(0.0, 0.0);
        pose.update_world_transform();
        let bounds = pose.bounds();

        // Shift so the box's minimum corner sits half a margin from the origin,
        // leaving uniform padding whatever the asset's native origin is
        pose.set_position(EDGE_MARGIN / 2.0 - bounds.x, EDGE_MARGIN / 2.0 - bounds.y);
        pose.update_world_transform();

        let surface_width = (bounds.width + EDGE_MARGIN).ceil() as u32;
        let surface_height = (bounds.height + EDGE_MARGIN).ceil() as u32;
        let mut surface = self
            .runtime
            .create_surface(surface_width, surface_height)
            .map_err(|_| ExportError::SurfaceAllocation {
                width: surface_width,
                height: surface_height,
            })?;

        let character = naming::character_id(skel_path);
        let character_dir = self.dest_dir.join(&character);
        fs::create_dir_all(&character_dir)?;

        info!("----- start drawing '{character}' -----");

        let animations = pose.animation_names();
        let total = animations.len();

        for animation_name in &animations {
            if !is_static_animation(animation_name, total) {
                info!("drawing animated animation is not supported, skipping '{animation_name}'");
                continue;
            }

            info!("start drawing static animation '{animation_name}'");

            match self.draw_static_pose(&mut pose, &mut surface, &character_dir, &character, animation_name) {
                Ok(_) => info!("done drawing static animation '{animation_name}'"),
                Err(err) => error!("{err}"),
            }
        }

        Ok(())
    }

    /// Pose the skeleton at the clip's first frame and write one image
    fn draw_static_pose(
        &self,
        pose: &mut R::Pose,
        surface: &mut R::Surface,
        character_dir: &Path,
        character: &str,
        animation_name: &str,
    ) -> Result<(), ExportError> {
        pose.set_animation(animation_name)
            .map_err(|err| ExportError::Animation {
                name: animation_name.to_owned(),
                message: err.to_string(),
            })?;

        // Evaluate at time 0, i.e. the clip's first-frame pose
        pose.update(0.0);

        surface.clear_transparent();
        self.runtime.draw(pose, surface);

        let file_path = character_dir.join(naming::output_file_name(
            character,
            animation_name,
            &self.file_extension,
            None,
        ));

        surface
            .save_to_file(&file_path)
            .map_err(|err| ExportError::ImageWrite {
                path: file_path.clone(),
                message: err.to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::Bounds;
    use rstest::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::error::Error;
    use std::rc::Rc;
    use super::*;

    #[derive(Default)]
    struct Recorder {
        surfaces: Vec<(u32, u32)>,
        draws: Vec<String>,
        saved: Vec<PathBuf>,
    }

    struct FakePose {
        animations: Vec<String>,
        bounds: Bounds,
        active: Option<String>,
    }

    impl PoseGraph for FakePose {
        fn set_position(&mut self, _x: f32, _y: f32) {}

        fn update_world_transform(&mut self) {}

        fn bounds(&mut self) -> Bounds {
            self.bounds
        }

        fn animation_names(&self) -> Vec<String> {
            self.animations.clone()
        }

        fn set_animation(&mut self, name: &str) -> Result<(), Box<dyn Error>> {
            self.active = Some(name.to_owned());
            Ok(())
        }

        fn update(&mut self, _delta: f32) {}
    }

    struct FakeSurface {
        recorder: Rc<RefCell<Recorder>>,
    }

    impl RenderSurface for FakeSurface {
        fn clear_transparent(&mut self) {}

        fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn Error>> {
            self.recorder.borrow_mut().saved.push(path.to_path_buf());
            Ok(())
        }
    }

    struct FakeRuntime {
        bounds: Bounds,
        // Animation lists keyed by skeleton file stem; missing stems fail to load
        assets: HashMap<String, Vec<String>>,
        recorder: Rc<RefCell<Recorder>>,
    }

    impl FakeRuntime {
        fn new(assets: &[(&str, &[&str])]) -> FakeRuntime {
            FakeRuntime {
                bounds: Bounds { x: -40.0, y: 10.0, width: 100.0, height: 60.0 },
                assets: assets
                    .iter()
                    .map(|(stem, animations)| {
                        ((*stem).to_owned(), animations.iter().map(|a| (*a).to_owned()).collect())
                    })
                    .collect(),
                recorder: Rc::new(RefCell::new(Recorder::default())),
            }
        }
    }

    impl SkeletonRuntime for FakeRuntime {
        type Pose = FakePose;
        type Surface = FakeSurface;

        fn load_pose(
            &self,
            skel_path: &Path,
            _atlas_path: &Path,
            _scale: f32,
        ) -> Result<FakePose, Box<dyn Error>> {
            let stem = skel_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();

            let animations = self.assets.get(&stem).ok_or("unreadable skeleton data")?;

            Ok(FakePose {
                animations: animations.clone(),
                bounds: self.bounds,
                active: None,
            })
        }

        fn create_surface(&self, width: u32, height: u32) -> Result<FakeSurface, Box<dyn Error>> {
            if width == 0 || height == 0 {
                return Err("zero sized surface".into());
            }

            self.recorder.borrow_mut().surfaces.push((width, height));
            Ok(FakeSurface { recorder: self.recorder.clone() })
        }

        fn draw(&self, pose: &mut FakePose, _surface: &mut FakeSurface) {
            let active = pose.active.clone().unwrap_or_default();
            self.recorder.borrow_mut().draws.push(active);
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("skelport_export_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[rstest]
    fn exports_one_image_per_static_animation() {
        let dest = temp_dir("static");
        let runtime = FakeRuntime::new(&[(
            "Boss01_Spr",
            &["attack", "idle", "Idle_EyeClose", "walk"][..],
        )]);
        let recorder = runtime.recorder.clone();
        let exporter = SpriteExporter::new(runtime, &dest, "png", 0.5);

        exporter.export_asset(Path::new("Boss01_Spr.skel")).unwrap();

        // idle loses to the multi-animation rule, eye-close is never static
        let recorder = recorder.borrow();
        assert_eq!(recorder.draws, vec!["attack", "walk"]);
        assert_eq!(
            recorder.saved,
            vec![
                dest.join("boss01/boss01--attack.png"),
                dest.join("boss01/boss01--walk.png"),
            ]
        );
        assert!(dest.join("boss01").is_dir());

        let _ = fs::remove_dir_all(&dest);
    }

    #[rstest]
    fn sole_idle_animation_is_exported() {
        let dest = temp_dir("sole_idle");
        let runtime = FakeRuntime::new(&[("Aru_spr", &["Idle_01"][..])]);
        let recorder = runtime.recorder.clone();
        let exporter = SpriteExporter::new(runtime, &dest, "png", 0.5);

        exporter.export_asset(Path::new("Aru_spr.skel")).unwrap();

        assert_eq!(
            recorder.borrow().saved,
            vec![dest.join("aru/aru--Idle_01.png")]
        );

        let _ = fs::remove_dir_all(&dest);
    }

    #[rstest]
    fn surface_matches_padded_bounds() {
        let dest = temp_dir("bounds");
        let mut runtime = FakeRuntime::new(&[("Aru_spr", &["attack"][..])]);
        runtime.bounds = Bounds { x: -40.0, y: 10.0, width: 100.5, height: 60.0 };
        let recorder = runtime.recorder.clone();
        let exporter = SpriteExporter::new(runtime, &dest, "png", 0.5);

        exporter.export_asset(Path::new("Aru_spr.skel")).unwrap();

        assert_eq!(recorder.borrow().surfaces, vec![(121, 80)]);

        let _ = fs::remove_dir_all(&dest);
    }

    #[rstest]
    fn surface_allocation_failure_reports_dimensions() {
        let dest = temp_dir("alloc");
        let mut runtime = FakeRuntime::new(&[("Aru_spr", &["attack"][..])]);
        runtime.bounds = Bounds { x: 0.0, y: 0.0, width: -100.0, height: 10.0 };
        let exporter = SpriteExporter::new(runtime, &dest, "png", 0.5);

        let err = exporter.export_asset(Path::new("Aru_spr.skel")).unwrap_err();
        match err {
            ExportError::SurfaceAllocation { width, height } => {
                assert_eq!((width, height), (0, 30));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Failed before the character directory was created
        assert!(!dest.join("aru").exists());

        let _ = fs::remove_dir_all(&dest);
    }

    #[rstest]
    fn asset_without_animations_creates_empty_directory() {
        let dest = temp_dir("empty");
        let runtime = FakeRuntime::new(&[("Statue_spr", &[][..])]);
        let recorder = runtime.recorder.clone();
        let exporter = SpriteExporter::new(runtime, &dest, "png", 0.5);

        exporter.export_asset(Path::new("Statue_spr.skel")).unwrap();

        assert!(recorder.borrow().saved.is_empty());
        assert!(dest.join("statue").is_dir());
        assert_eq!(fs::read_dir(dest.join("statue")).unwrap().count(), 0);

        let _ = fs::remove_dir_all(&dest);
    }

    #[rstest]
    fn corrupt_asset_does_not_stop_the_run() {
        let dest = temp_dir("isolation");
        let input = temp_dir("isolation_input");
        fs::create_dir_all(input.join("nested")).unwrap();

        for name in [
            "Good_spr.skel",
            "Broken_spr.skel",
            "Home.skel",
            "nested/Other_spr.skel",
            "notes.txt",
        ] {
            fs::write(input.join(name), b"").unwrap();
        }

        // Broken_spr is not registered, so its load fails
        let runtime = FakeRuntime::new(&[
            ("Good_spr", &["attack"][..]),
            ("Other_spr", &["guard"][..]),
        ]);
        let recorder = runtime.recorder.clone();
        let exporter = SpriteExporter::new(runtime, &dest, "png", 0.5);

        exporter.export_directory(&input).unwrap();

        let mut saved = recorder.borrow().saved.clone();
        saved.sort();
        assert_eq!(
            saved,
            vec![
                dest.join("good/good--attack.png"),
                dest.join("other/other--guard.png"),
            ]
        );

        let _ = fs::remove_dir_all(&dest);
        let _ = fs::remove_dir_all(&input);
    }

    #[rstest]
    fn export_is_repeatable() {
        let dest = temp_dir("repeat");
        let runtime = FakeRuntime::new(&[("Aru_spr", &["attack"][..])]);
        let recorder = runtime.recorder.clone();
        let exporter = SpriteExporter::new(runtime, &dest, "png", 0.5);

        exporter.export_asset(Path::new("Aru_spr.skel")).unwrap();
        exporter.export_asset(Path::new("Aru_spr.skel")).unwrap();

        let recorder = recorder.borrow();
        assert_eq!(recorder.saved.len(), 2);
        assert_eq!(recorder.saved[0], recorder.saved[1]);

        let _ = fs::remove_dir_all(&dest);
    }
}
