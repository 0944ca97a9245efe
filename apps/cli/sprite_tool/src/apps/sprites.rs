use crate::apps::SubApp;
use clap::Parser;

use std::error::Error;
use std::path::Path;

use skelport::export::SpriteExporter;
use skelport::spine::SpineRuntime;

#[derive(Parser, Debug)]
pub struct SpritesApp {
    #[arg(help = "Path to input directory containing .skel/.atlas pairs", default_value = ".")]
    pub input_dir: String,
    #[arg(help = "Path to output directory", default_value = "result")]
    pub dest_dir: String,
    #[arg(help = "Output image file extension", default_value = "png")]
    pub file_extension: String,
    #[arg(help = "Uniform scale applied to loaded skeletons", default_value_t = 0.5)]
    pub scale: f32,
}

impl SubApp for SpritesApp {
    fn process(&mut self) -> Result<(), Box<dyn Error>> {
        let exporter = SpriteExporter::new(
            SpineRuntime::new(),
            Path::new(&self.dest_dir),
            &self.file_extension,
            self.scale,
        );

        exporter.export_directory(Path::new(&self.input_dir))?;

        Ok(())
    }
}
