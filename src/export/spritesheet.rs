//! Spritesheet descriptions in RON.
//!
//! One file per tileset lists the whole image grid, so the engine can load
//! the tileset image as a sprite sheet and address tiles by id.

use std::path::Path;

use crate::error::Result;
use crate::records::{SpriteRect, TilesetRecord};

use super::write_text;

/// Spritesheet description of one tileset image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spritesheet {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub sprites: Vec<SpriteRect>,
}

impl Spritesheet {
    pub fn from_tileset(tileset: &TilesetRecord) -> Self {
        Self {
            filename: tileset.image_filename.clone(),
            width: tileset.image_width,
            height: tileset.image_height,
            sprites: tileset.sprites(),
        }
    }

    /// Render as RON text.
    ///
    /// The layout (field order, column alignment, trailing commas) is fixed;
    /// downstream loaders and diffs rely on it.
    pub fn to_ron(&self) -> String {
        let mut output = String::new();
        output.push('(');
        output.push_str(&format!("\n  filename: {:?},", self.filename));
        output.push_str(&format!("\n  spritesheet_width:  {},", self.width));
        output.push_str(&format!("\n  spritesheet_height: {},", self.height));
        output.push_str("\n  sprites: [");
        for sprite in &self.sprites {
            output.push_str("\n    (");
            output.push_str(&format!("\n      x:      {},", sprite.x));
            output.push_str(&format!("\n      y:      {},", sprite.y));
            output.push_str(&format!("\n      width:  {},", sprite.width));
            output.push_str(&format!("\n      height: {},", sprite.height));
            output.push_str("\n    ),");
        }
        output.push_str("\n  ],");
        output.push_str("\n)\n");
        output
    }
}

/// Write a spritesheet description to `path`.
pub fn write_spritesheet(sheet: &Spritesheet, path: &Path) -> Result<()> {
    write_text(path, &sheet.to_ron())
}
