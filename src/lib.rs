//! tilemap-export - Tile map export pipeline
//!
//! Turns a tile map (tile layers, object layers and tilesets) into the
//! files a game engine loads: a map document, a tileset document and one
//! RON spritesheet per tileset.
//!
//! # Example
//!
//! ```ignore
//! use tilemap_export::{export, ExportOptions, MapDocument};
//!
//! let map = MapDocument::load("maps/level.yaml".as_ref())?;
//! let summary = export(&map, "dist/level.json".as_ref(), &ExportOptions::default())?;
//! println!("wrote {} files", summary.written.len());
//! ```

pub mod cli;
pub mod config;
pub mod coords;
pub mod document;
pub mod error;
pub mod export;
pub mod output;
pub mod properties;
pub mod records;
pub mod source;

pub use config::ExportOptions;
pub use coords::{object_position, tile_position, ObjectPosition, Origin, Position};
pub use document::MapDocument;
pub use error::{ExportError, Result};
pub use export::{collect, export, ExportSummary, OutputPaths, Records, Spritesheet};
pub use properties::{coerce_properties, coerce_value, Coercion, Properties, PropertyValue};
pub use records::{enumerate_sprites, ObjectRecord, Size, SpriteRect, TileRecord, TilesetRecord};
pub use source::{
    Cell, Layer, PropertySource, SourceMap, SourceObject, SourceObjectLayer, SourceTile,
    SourceTileLayer, SourceTileset,
};
