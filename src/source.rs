//! Read-only view of a source tile map.
//!
//! The exporter never owns the editor's data model. It only queries it
//! through these traits, so any model (an editor plugin host, a parsed file,
//! a test fixture) can be exported by implementing them.

/// Anything carrying string-valued custom properties.
pub trait PropertySource {
    /// Names of all properties set on this entity.
    fn property_keys(&self) -> Vec<String>;

    /// Raw string value of a property, if set.
    fn property_as_string(&self, key: &str) -> Option<String>;
}

/// A tile definition within a tileset.
pub trait SourceTile: PropertySource {
    /// Id of the tile, stable within its tileset.
    fn id(&self) -> u32;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// A tileset sliced from one image.
pub trait SourceTileset: PropertySource {
    fn name(&self) -> &str;

    /// Image path as `/`-delimited text.
    fn image_source(&self) -> &str;

    fn image_width(&self) -> u32;
    fn image_height(&self) -> u32;

    /// Width of one grid cell in pixels.
    fn tile_width(&self) -> u32;

    /// Height of one grid cell in pixels.
    fn tile_height(&self) -> u32;
}

/// A freely positioned object in source (top-left origin) pixels.
pub trait SourceObject: PropertySource {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn name(&self) -> &str;

    /// Free-form type tag.
    fn object_type(&self) -> &str;
    fn is_visible(&self) -> bool;
}

/// An occupied grid cell.
#[derive(Clone, Copy)]
pub struct Cell<'a> {
    pub tile: &'a dyn SourceTile,
    pub tileset: &'a dyn SourceTileset,
}

/// A layer holding a grid of cells.
pub trait SourceTileLayer {
    fn is_visible(&self) -> bool;

    /// Width in tiles.
    fn width(&self) -> u32;

    /// Height in tiles.
    fn height(&self) -> u32;

    /// The cell at `(col, row)`, or `None` when empty.
    fn cell_at(&self, col: u32, row: u32) -> Option<Cell<'_>>;
}

/// A layer holding free-form objects.
pub trait SourceObjectLayer {
    /// Objects in source order.
    fn objects(&self) -> Vec<&dyn SourceObject>;
}

impl<T: SourceObjectLayer + ?Sized> SourceObjectLayer for &T {
    fn objects(&self) -> Vec<&dyn SourceObject> {
        (**self).objects()
    }
}

/// One layer of a source map.
///
/// Layers are boxed so a map can hand out borrowed views that resolve
/// cells against its own tilesets.
pub enum Layer<'a> {
    Tiles(Box<dyn SourceTileLayer + 'a>),
    Objects(Box<dyn SourceObjectLayer + 'a>),
}

/// A whole source map.
pub trait SourceMap {
    /// Map width in tiles.
    fn width(&self) -> u32;

    /// Map height in tiles.
    fn height(&self) -> u32;

    /// Map tile width in pixels.
    fn tile_width(&self) -> u32;

    /// Map tile height in pixels.
    fn tile_height(&self) -> u32;

    /// Layers in source order.
    fn layers(&self) -> Vec<Layer<'_>>;

    /// Tilesets in source order.
    fn tilesets(&self) -> Vec<&dyn SourceTileset>;

    /// Total map height in pixels.
    fn pixel_height(&self) -> i64 {
        i64::from(self.height()) * i64::from(self.tile_height())
    }
}
