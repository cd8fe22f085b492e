//! Exportable records assembled from source entities.
//!
//! Each record is built once from the source map and never revisited. Field
//! order here is the field order of the written documents.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ExportOptions;
use crate::coords::{object_position, tile_position, ObjectPosition, Position};
use crate::properties::Properties;
use crate::source::{Cell, SourceObject, SourceTile, SourceTileset};

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// One placed tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileRecord {
    pub id: u32,
    pub pos: Position,
    pub tileset: String,
    pub properties: Properties,
}

impl TileRecord {
    /// Build the record for the occupied cell at grid `(col, row)`.
    pub fn from_cell(
        cell: Cell<'_>,
        col: u32,
        row: u32,
        map_pixel_height: i64,
        options: &ExportOptions,
    ) -> Self {
        let pos = tile_position(
            col,
            row,
            cell.tileset.tile_width(),
            cell.tileset.tile_height(),
            map_pixel_height,
            options.origin,
        );

        let record = Self {
            id: cell.tile.id(),
            pos,
            tileset: cell.tileset.name().to_string(),
            properties: options.coercion().coerce_all(cell.tile),
        };
        debug!(
            id = record.id,
            tileset = %record.tileset,
            col,
            row,
            x = pos.x,
            y = pos.y,
            "tile"
        );
        record
    }
}

/// One free-form object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub pos: ObjectPosition,
    pub size: Size,
    pub properties: Properties,
    /// Hidden objects are collected but left out of the map document.
    #[serde(skip)]
    pub visible: bool,
}

impl ObjectRecord {
    pub fn from_object(
        object: &dyn SourceObject,
        map_pixel_height: i64,
        options: &ExportOptions,
    ) -> Self {
        let record = Self {
            name: object.name().to_string(),
            object_type: object.object_type().to_string(),
            pos: object_position(object.x(), object.y(), map_pixel_height, options.origin),
            size: Size::new(object.width(), object.height()),
            properties: options.coercion().coerce_all(object),
            visible: object.is_visible(),
        };
        debug!(
            name = %record.name,
            object_type = %record.object_type,
            x = record.pos.x,
            y = record.pos.y,
            visible = record.visible,
            "object"
        );
        record
    }
}

/// A rectangle in tileset-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One tileset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilesetRecord {
    #[serde(skip)]
    pub name: String,
    pub image_filename: String,
    pub tile_size: Size,
    pub properties: Properties,
    #[serde(skip)]
    pub image_width: u32,
    #[serde(skip)]
    pub image_height: u32,
}

impl TilesetRecord {
    pub fn from_tileset(tileset: &dyn SourceTileset, options: &ExportOptions) -> Self {
        let record = Self {
            name: tileset.name().to_string(),
            image_filename: image_basename(tileset.image_source()).to_string(),
            tile_size: Size::new(tileset.tile_width(), tileset.tile_height()),
            properties: options.coercion().coerce_all(tileset),
            image_width: tileset.image_width(),
            image_height: tileset.image_height(),
        };
        if record.tile_size.w == 0 || record.tile_size.h == 0 {
            warn!(tileset = %record.name, "tileset has a zero tile size, no sprites will be listed");
        }
        debug!(
            tileset = %record.name,
            image = %record.image_filename,
            tile_w = record.tile_size.w,
            tile_h = record.tile_size.h,
            "tileset"
        );
        record
    }

    /// Every sprite rectangle of this tileset's image.
    pub fn sprites(&self) -> Vec<SpriteRect> {
        enumerate_sprites(
            self.image_width,
            self.image_height,
            self.tile_size.w,
            self.tile_size.h,
        )
    }
}

/// Final `/`-delimited segment of an image path.
pub fn image_basename(source: &str) -> &str {
    source.rsplit('/').next().unwrap_or(source)
}

/// Slice an image into whole `tile_width` x `tile_height` cells, row-major.
///
/// Partial cells along the right and bottom edges are skipped. Consumers
/// address sprites by index, so the order is part of the output format.
pub fn enumerate_sprites(
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
) -> Vec<SpriteRect> {
    if tile_width == 0 || tile_height == 0 {
        return vec![];
    }

    let per_row = image_width / tile_width;
    let per_col = image_height / tile_height;

    (0..per_col)
        .flat_map(|row| {
            (0..per_row).map(move |col| SpriteRect {
                x: col * tile_width,
                y: row * tile_height,
                width: tile_width,
                height: tile_height,
            })
        })
        .collect()
}
