//! Inspect command: summarize map documents.

use std::path::PathBuf;

use clap::Args;

use crate::document::{LayerDef, MapDocument};
use crate::error::Result;
use crate::output::plural;
use crate::records::{enumerate_sprites, image_basename};
use crate::source::SourceMap;

/// Summarize map documents without writing anything
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Map documents to inspect
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: InspectArgs) -> Result<()> {
    for file in &args.files {
        let document = MapDocument::load(file)?;
        println!("{}", file.display());
        print!("{}", describe(&document));
    }
    Ok(())
}

/// One line for the map, then one per tileset and per layer.
pub fn describe(document: &MapDocument) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "  map      {}x{} tiles of {}x{} px ({}x{} px)\n",
        document.width,
        document.height,
        document.tile_width,
        document.tile_height,
        u64::from(document.width) * u64::from(document.tile_width),
        document.pixel_height()
    ));

    for tileset in &document.tilesets {
        let image_width = tileset.image_width.unwrap_or(0);
        let image_height = tileset.image_height.unwrap_or(0);
        let sprites = enumerate_sprites(
            image_width,
            image_height,
            tileset.tile_width,
            tileset.tile_height,
        );
        output.push_str(&format!(
            "  tileset  {}: {} {}x{} px, {}x{} tiles, {}\n",
            tileset.name,
            image_basename(&tileset.image),
            image_width,
            image_height,
            tileset.tile_width,
            tileset.tile_height,
            plural(sprites.len(), "sprite", "sprites")
        ));
    }

    for layer in &document.layers {
        match layer {
            LayerDef::Tiles(layer) => {
                let visibility = if layer.visible { "" } else { " (hidden)" };
                output.push_str(&format!(
                    "  tiles    {}: {}{}\n",
                    display_name(&layer.name),
                    plural(layer.cells.len(), "cell", "cells"),
                    visibility
                ));
            }
            LayerDef::Objects(layer) => {
                let hidden = layer.objects.iter().filter(|o| !o.visible).count();
                let mut line = format!(
                    "  objects  {}: {}",
                    display_name(&layer.name),
                    plural(layer.objects.len(), "object", "objects")
                );
                if hidden > 0 {
                    line.push_str(&format!(", {} hidden", hidden));
                }
                output.push_str(&line);
                output.push('\n');
            }
        }
    }

    output
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "<unnamed>"
    } else {
        name
    }
}
