//! Conversion from editor space to engine space.
//!
//! Editors put the origin at the top-left with y growing downward. The
//! engine expects a bottom-left origin with y growing upward, so y is
//! mirrored against the total map pixel height. x never changes.
//!
//! Tiles and objects are deliberately handled differently: a tile's y comes
//! from its grid row scaled by its own tileset's tile height (tilesets on one
//! map may differ in tile size), while an object's y is already in source
//! pixels and is mirrored as is.

use serde::{Deserialize, Serialize, Serializer};

/// A position in output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// An object position in output pixels.
///
/// Objects are not grid-aligned, so positions may be fractional. Whole values
/// are written as JSON integers, fractional ones as floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectPosition {
    #[serde(serialize_with = "whole_or_fraction")]
    pub x: f64,
    #[serde(serialize_with = "whole_or_fraction")]
    pub y: f64,
}

impl ObjectPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Largest magnitude below which every whole f64 is exact as an i64.
const EXACT_WHOLE: f64 = 9_007_199_254_740_992.0;

fn whole_or_fraction<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= EXACT_WHOLE {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Where the exported coordinate system has its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Engine space: y up, measured from the bottom of the map.
    #[default]
    BottomLeft,
    /// Editor space, left untouched.
    TopLeft,
}

/// Engine position of a tile placed at grid `(col, row)`.
///
/// `tile_width`/`tile_height` are the tile size of the cell's tileset, and
/// `map_pixel_height` is map height in tiles times the map's tile height.
pub fn tile_position(
    col: u32,
    row: u32,
    tile_width: u32,
    tile_height: u32,
    map_pixel_height: i64,
    origin: Origin,
) -> Position {
    let x = i64::from(col) * i64::from(tile_width);
    let y = i64::from(row) * i64::from(tile_height);
    match origin {
        Origin::BottomLeft => Position::new(x, map_pixel_height - y),
        Origin::TopLeft => Position::new(x, y),
    }
}

/// Engine position of an object stored at source pixels `(x, y)`.
pub fn object_position(x: f64, y: f64, map_pixel_height: i64, origin: Origin) -> ObjectPosition {
    match origin {
        Origin::BottomLeft => ObjectPosition::new(x, map_pixel_height as f64 - y),
        Origin::TopLeft => ObjectPosition::new(x, y),
    }
}
