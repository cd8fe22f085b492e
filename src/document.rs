//! In-memory tile map documents.
//!
//! `MapDocument` is a plain, serde-backed map model that implements the
//! `source` traits, so maps can be exported without an editor host. It is
//! read from YAML or JSON:
//!
//! ```yaml
//! width: 10
//! height: 5
//! tile_width: 16
//! tile_height: 16
//! tilesets:
//!   - name: ground
//!     image: ../textures/ground.png
//!     image_width: 64
//!     image_height: 32
//!     tile_width: 16
//!     tile_height: 16
//!     tiles:
//!       - id: 0
//!         properties: { solid: true, components: "Solid; Collision" }
//! layers:
//!   - type: tiles
//!     name: terrain
//!     cells:
//!       - { col: 2, row: 3, tileset: ground, tile: 0 }
//!   - type: objects
//!     objects:
//!       - { type: Player, x: 32, y: 48, width: 16, height: 32 }
//! ```
//!
//! Cells name their tileset and tile id. Tiles without an explicit entry
//! resolve to a tile with no properties. When a tileset leaves out the image
//! size, it is read from the image file relative to the document.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::source::{
    Cell, Layer, PropertySource, SourceMap, SourceObject, SourceObjectLayer, SourceTile,
    SourceTileLayer, SourceTileset,
};

/// A complete tile map.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapDocument {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default)]
    pub tilesets: Vec<TilesetDef>,
    #[serde(default)]
    pub layers: Vec<LayerDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TilesetDef {
    pub name: String,
    /// Image path, `/`-delimited.
    pub image: String,
    #[serde(default)]
    pub image_width: Option<u32>,
    #[serde(default)]
    pub image_height: Option<u32>,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(default, deserialize_with = "scalar_properties")]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub tiles: Vec<TileDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileDef {
    pub id: u32,
    #[serde(default, deserialize_with = "scalar_properties")]
    pub properties: BTreeMap<String, String>,
    /// Pixel size, copied from the tileset on resolve.
    #[serde(skip)]
    size: (u32, u32),
}

impl TileDef {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            properties: BTreeMap::new(),
            size: (0, 0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerDef {
    Tiles(TileLayerDef),
    Objects(ObjectLayerDef),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileLayerDef {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Width in tiles, defaults to the map width.
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in tiles, defaults to the map height.
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub cells: Vec<CellDef>,
    /// `(col, row)` -> `(tileset index, tile index)`, built on resolve.
    #[serde(skip)]
    index: HashMap<(u32, u32), (usize, usize)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellDef {
    pub col: u32,
    pub row: u32,
    pub tileset: String,
    pub tile: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectLayerDef {
    #[serde(default)]
    pub name: String,
    /// Kept for completeness; object layers are exported regardless.
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDef {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub object_type: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, deserialize_with = "scalar_properties")]
    pub properties: BTreeMap<String, String>,
}

fn default_visible() -> bool {
    true
}

/// Accept any scalar property value and keep its text form.
fn scalar_properties<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(D::Error::custom(format!(
                        "property '{}' must be a string, number or boolean",
                        key
                    )))
                }
            };
            Ok((key, text))
        })
        .collect()
}

impl MapDocument {
    /// Load a map from a `.yaml`, `.yml` or `.json` file.
    ///
    /// Image paths are resolved relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ExportError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read map: {}", e),
        })?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let mut document: MapDocument = if is_json {
            serde_json::from_str(&content).map_err(|e| ExportError::Parse {
                message: format!("Invalid map {}: {}", path.display(), e),
                help: None,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| ExportError::Parse {
                message: format!("Invalid map {}: {}", path.display(), e),
                help: None,
            })?
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        document.resolve(base_dir)?;
        Ok(document)
    }

    /// Parse a map from YAML (or JSON) text, resolving images from the
    /// current directory.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_in(content, Path::new("."))
    }

    /// Parse a map from YAML (or JSON) text, resolving images from `base_dir`.
    pub fn parse_in(content: &str, base_dir: &Path) -> Result<Self> {
        let mut document: MapDocument =
            serde_yaml::from_str(content).map_err(|e| ExportError::Parse {
                message: format!("Invalid map: {}", e),
                help: None,
            })?;
        document.resolve(base_dir)?;
        Ok(document)
    }

    /// Fill in image sizes and link every cell to its tileset and tile.
    pub fn resolve(&mut self, base_dir: &Path) -> Result<()> {
        for tileset in &mut self.tilesets {
            tileset.resolve_image_size(base_dir)?;
        }

        // Cells resolve to the first tileset carrying their name.
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (idx, tileset) in self.tilesets.iter().enumerate() {
            by_name.entry(tileset.name.clone()).or_insert(idx);
        }

        let (map_width, map_height) = (self.width, self.height);
        for layer in &mut self.layers {
            let LayerDef::Tiles(layer) = layer else {
                continue;
            };

            let width = layer.width.unwrap_or(map_width);
            let height = layer.height.unwrap_or(map_height);
            layer.index.clear();

            for cell in &layer.cells {
                if cell.col >= width || cell.row >= height {
                    return Err(ExportError::Parse {
                        message: format!(
                            "Layer '{}': cell ({}, {}) is outside the {}x{} grid",
                            layer.name, cell.col, cell.row, width, height
                        ),
                        help: None,
                    });
                }

                let Some(&tileset_idx) = by_name.get(&cell.tileset) else {
                    return Err(ExportError::Parse {
                        message: format!(
                            "Layer '{}': cell ({}, {}) references unknown tileset '{}'",
                            layer.name, cell.col, cell.row, cell.tileset
                        ),
                        help: Some("Add the tileset to the map's tilesets list".to_string()),
                    });
                };

                let tile_idx = self.tilesets[tileset_idx].tile_index(cell.tile);
                if layer
                    .index
                    .insert((cell.col, cell.row), (tileset_idx, tile_idx))
                    .is_some()
                {
                    return Err(ExportError::Parse {
                        message: format!(
                            "Layer '{}': cell ({}, {}) is set more than once",
                            layer.name, cell.col, cell.row
                        ),
                        help: None,
                    });
                }
            }
        }

        for tileset in &mut self.tilesets {
            let size = (tileset.tile_width, tileset.tile_height);
            for tile in &mut tileset.tiles {
                tile.size = size;
            }
        }

        Ok(())
    }
}

impl TilesetDef {
    /// Index of the tile with `id`, adding a bare tile if it has no entry.
    fn tile_index(&mut self, id: u32) -> usize {
        if let Some(idx) = self.tiles.iter().position(|t| t.id == id) {
            return idx;
        }
        self.tiles.push(TileDef::new(id));
        self.tiles.len() - 1
    }

    fn resolve_image_size(&mut self, base_dir: &Path) -> Result<()> {
        if let (Some(_), Some(_)) = (self.image_width, self.image_height) {
            return Ok(());
        }

        let path = base_dir.join(&self.image);
        let (w, h) = image::image_dimensions(&path).map_err(|e| ExportError::Io {
            path: path.clone(),
            message: format!("Failed to read tileset image size: {}", e),
        })?;
        debug!(tileset = %self.name, w, h, "read image size");

        self.image_width = self.image_width.or(Some(w));
        self.image_height = self.image_height.or(Some(h));
        Ok(())
    }
}

fn keys(properties: &BTreeMap<String, String>) -> Vec<String> {
    properties.keys().cloned().collect()
}

impl PropertySource for TileDef {
    fn property_keys(&self) -> Vec<String> {
        keys(&self.properties)
    }

    fn property_as_string(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

impl SourceTile for TileDef {
    fn id(&self) -> u32 {
        self.id
    }

    fn width(&self) -> u32 {
        self.size.0
    }

    fn height(&self) -> u32 {
        self.size.1
    }
}

impl PropertySource for TilesetDef {
    fn property_keys(&self) -> Vec<String> {
        keys(&self.properties)
    }

    fn property_as_string(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

impl SourceTileset for TilesetDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn image_source(&self) -> &str {
        &self.image
    }

    fn image_width(&self) -> u32 {
        self.image_width.unwrap_or(0)
    }

    fn image_height(&self) -> u32 {
        self.image_height.unwrap_or(0)
    }

    fn tile_width(&self) -> u32 {
        self.tile_width
    }

    fn tile_height(&self) -> u32 {
        self.tile_height
    }
}

impl PropertySource for ObjectDef {
    fn property_keys(&self) -> Vec<String> {
        keys(&self.properties)
    }

    fn property_as_string(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

impl SourceObject for ObjectDef {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn object_type(&self) -> &str {
        &self.object_type
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

impl SourceObjectLayer for ObjectLayerDef {
    fn objects(&self) -> Vec<&dyn SourceObject> {
        self.objects.iter().map(|o| o as &dyn SourceObject).collect()
    }
}

/// A tile layer bound to the document that owns its tilesets.
struct TileLayerView<'a> {
    document: &'a MapDocument,
    layer: &'a TileLayerDef,
}

impl SourceTileLayer for TileLayerView<'_> {
    fn is_visible(&self) -> bool {
        self.layer.visible
    }

    fn width(&self) -> u32 {
        self.layer.width.unwrap_or(self.document.width)
    }

    fn height(&self) -> u32 {
        self.layer.height.unwrap_or(self.document.height)
    }

    fn cell_at(&self, col: u32, row: u32) -> Option<Cell<'_>> {
        let &(tileset_idx, tile_idx) = self.layer.index.get(&(col, row))?;
        let tileset = self.document.tilesets.get(tileset_idx)?;
        let tile = tileset.tiles.get(tile_idx)?;
        Some(Cell { tile, tileset })
    }
}

impl SourceMap for MapDocument {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tile_width(&self) -> u32 {
        self.tile_width
    }

    fn tile_height(&self) -> u32 {
        self.tile_height
    }

    fn layers(&self) -> Vec<Layer<'_>> {
        self.layers
            .iter()
            .map(|layer| match layer {
                LayerDef::Tiles(layer) => Layer::Tiles(Box::new(TileLayerView {
                    document: self,
                    layer,
                })),
                LayerDef::Objects(layer) => Layer::Objects(Box::new(layer)),
            })
            .collect()
    }

    fn tilesets(&self) -> Vec<&dyn SourceTileset> {
        self.tilesets
            .iter()
            .map(|t| t as &dyn SourceTileset)
            .collect()
    }
}
