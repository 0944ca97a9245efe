use std::error::Error;

mod apps;
use apps::SpriteTool;

fn main() -> Result<(), Box<dyn Error>> {
    let mut sprite_tool = SpriteTool::new();
    sprite_tool.run()
}
