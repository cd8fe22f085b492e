//! The export pipeline.
//!
//! One pass over the source map builds every record; a second pass
//! assembles and writes the documents:
//!
//! - the map document (tiles and visible objects) at the base path,
//! - the tileset document next to it as `.ts.json`,
//! - one RON spritesheet per tileset.
//!
//! Writes are not transactional. If one fails the run stops with an error
//! and files written before it stay on disk.

mod json;
mod paths;
mod spritesheet;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ExportOptions;
use crate::error::{ExportError, Result};
use crate::records::{ObjectRecord, TileRecord, TilesetRecord};
use crate::source::{Layer, SourceMap, SourceObjectLayer, SourceTileLayer};

pub use json::{to_json_line, write_json, MapData, TilesetDocument};
pub use paths::OutputPaths;
pub use spritesheet::{write_spritesheet, Spritesheet};

/// Every record collected from a source map.
#[derive(Debug, Clone, Default)]
pub struct Records {
    pub tilesets: Vec<TilesetRecord>,
    pub tiles: Vec<TileRecord>,
    /// All objects, hidden ones included.
    pub objects: Vec<ObjectRecord>,
}

impl Records {
    pub fn visible_objects(&self) -> usize {
        self.objects.iter().filter(|o| o.visible).count()
    }
}

/// What an export run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Written files, in write order.
    pub written: Vec<PathBuf>,
    pub tiles: usize,
    pub objects: usize,
    pub hidden_objects: usize,
    pub tilesets: usize,
}

/// Build records for every tileset, tile and object of `source`.
///
/// Hidden tile layers are skipped entirely. Object layers are always read;
/// object visibility is only applied when the map document is assembled.
pub fn collect(source: &dyn SourceMap, options: &ExportOptions) -> Records {
    let map_pixel_height = source.pixel_height();
    let mut records = Records::default();

    for tileset in source.tilesets() {
        records
            .tilesets
            .push(TilesetRecord::from_tileset(tileset, options));
    }

    for layer in source.layers() {
        match layer {
            Layer::Tiles(layer) => {
                if !layer.is_visible() {
                    continue;
                }
                for row in 0..layer.height() {
                    for col in 0..layer.width() {
                        if let Some(cell) = layer.cell_at(col, row) {
                            records.tiles.push(TileRecord::from_cell(
                                cell,
                                col,
                                row,
                                map_pixel_height,
                                options,
                            ));
                        }
                    }
                }
            }
            Layer::Objects(layer) => {
                for object in layer.objects() {
                    records
                        .objects
                        .push(ObjectRecord::from_object(object, map_pixel_height, options));
                }
            }
        }
    }

    records
}

/// Export `source` to the files derived from `base_path`.
///
/// Writes exactly two files plus one per tileset.
pub fn export(
    source: &dyn SourceMap,
    base_path: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let records = collect(source, options);
    write_records(&records, base_path)
}

/// Assemble and write the documents for already collected records.
pub fn write_records(records: &Records, base_path: &Path) -> Result<ExportSummary> {
    let paths = OutputPaths::new(base_path);
    let mut written = Vec::with_capacity(2 + records.tilesets.len());

    let map = MapData::assemble(&records.tiles, &records.objects);
    write_json(&map, &paths.map)?;
    written.push(paths.map.clone());

    let tilesets = TilesetDocument::assemble(&records.tilesets);
    write_json(&tilesets, &paths.tilesets)?;
    written.push(paths.tilesets.clone());

    for tileset in &records.tilesets {
        let path = paths.spritesheet(&tileset.name);
        write_spritesheet(&Spritesheet::from_tileset(tileset), &path)?;
        written.push(path);
    }

    let visible = records.visible_objects();
    Ok(ExportSummary {
        written,
        tiles: records.tiles.len(),
        objects: visible,
        hidden_objects: records.objects.len() - visible,
        tilesets: records.tilesets.len(),
    })
}

/// Write text to `path`, replacing any existing file.
pub(crate) fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write file: {}", e),
    })?;
    info!(path = %path.display(), bytes = content.len(), "wrote");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ObjectPosition, Origin, Position};
    use crate::document::MapDocument;
    use crate::properties::PropertyValue;
    use pretty_assertions::assert_eq;

    const LEVEL: &str = r#"
width: 6
height: 5
tile_width: 16
tile_height: 16
tilesets:
  - name: ground
    image: ../../textures/ground.png
    image_width: 64
    image_height: 32
    tile_width: 16
    tile_height: 16
    properties:
      friction: 0.8
    tiles:
      - id: 2
        properties:
          solid: true
          components: "Solid; Collision;"
  - name: deco
    image: deco.png
    image_width: 32
    image_height: 32
    tile_width: 32
    tile_height: 32
layers:
  - type: tiles
    name: hidden
    visible: false
    cells:
      - { col: 0, row: 0, tileset: ground, tile: 0 }
  - type: tiles
    name: terrain
    cells:
      - { col: 2, row: 3, tileset: ground, tile: 2 }
      - { col: 0, row: 4, tileset: ground, tile: 1 }
      - { col: 1, row: 1, tileset: deco, tile: 0 }
  - type: objects
    name: entities
    visible: false
    objects:
      - { name: hero, type: Player, x: 8, y: 0, width: 16, height: 32, properties: { speed: 1.5 } }
      - { name: ghost, type: Enemy, x: 40, y: 80, visible: false }
      - { type: Parallax, x: 0, y: 160, width: 96, height: 80 }
"#;

    fn level() -> MapDocument {
        MapDocument::parse(LEVEL).unwrap()
    }

    #[test]
    fn test_collect_tiles_row_major_from_visible_layers() {
        let records = collect(&level(), &ExportOptions::default());

        let ids: Vec<u32> = records.tiles.iter().map(|t| t.id).collect();
        // Row 1 (deco), row 3, row 4; the hidden layer contributes nothing.
        assert_eq!(ids, vec![0, 2, 1]);
        assert_eq!(records.tiles[0].tileset, "deco");
    }

    #[test]
    fn test_collect_tile_position() {
        let records = collect(&level(), &ExportOptions::default());

        let tile = &records.tiles[1];
        assert_eq!(tile.id, 2);
        assert_eq!(tile.pos, Position::new(32, 5 * 16 - 3 * 16));
        assert_eq!(tile.properties["solid"], PropertyValue::Boolean(true));
        assert_eq!(
            tile.properties["components"],
            PropertyValue::StringList(vec!["Solid".into(), "Collision".into(), "".into()])
        );
    }

    #[test]
    fn test_collect_mixed_tile_sizes() {
        let records = collect(&level(), &ExportOptions::default());

        // deco tiles are 32px: grid (1, 1) sits at x=32, y=80-32
        assert_eq!(records.tiles[0].pos, Position::new(32, 48));
    }

    #[test]
    fn test_collect_objects_ignore_layer_visibility() {
        let records = collect(&level(), &ExportOptions::default());

        assert_eq!(records.objects.len(), 3);
        assert_eq!(records.visible_objects(), 2);
        assert_eq!(records.objects[0].pos, ObjectPosition::new(8.0, 80.0));
        assert_eq!(records.objects[2].pos, ObjectPosition::new(0.0, -80.0));
        assert_eq!(
            records.objects[0].properties["speed"],
            PropertyValue::Float(1.5)
        );
    }

    #[test]
    fn test_collect_top_left_origin() {
        let options = ExportOptions {
            origin: Origin::TopLeft,
            ..Default::default()
        };
        let records = collect(&level(), &options);

        assert_eq!(records.tiles[1].pos, Position::new(32, 48));
        assert_eq!(records.objects[0].pos, ObjectPosition::new(8.0, 0.0));
    }

    #[test]
    fn test_export_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("level.json");

        let summary = export(&level(), &base, &ExportOptions::default()).unwrap();

        assert_eq!(summary.written.len(), 2 + 2);
        assert_eq!(summary.tiles, 3);
        assert_eq!(summary.objects, 2);
        assert_eq!(summary.hidden_objects, 1);
        assert_eq!(summary.tilesets, 2);
        for path in &summary.written {
            assert!(path.exists(), "{} should exist", path.display());
        }
        assert!(dir.path().join("level.ts.json").exists());
        assert!(dir.path().join("level_ground.spritesheet.ron").exists());
        assert!(dir.path().join("level_deco.spritesheet.ron").exists());
    }

    #[test]
    fn test_export_map_document() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("level.json");
        export(&level(), &base, &ExportOptions::default()).unwrap();

        let text = fs::read_to_string(&base).unwrap();
        assert!(text.ends_with("}\n"));
        assert_eq!(text.lines().count(), 1);

        let map: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(map["tiles"].as_array().unwrap().len(), 3);
        assert_eq!(map["tiles"][1]["pos"]["y"], 32);
        assert_eq!(map["tiles"][1]["tileset"], "ground");

        let objects = map["objects"].as_array().unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["name"], "hero");
        assert_eq!(objects[0]["type"], "Player");
        assert_eq!(objects[0]["size"]["h"], 32);
        assert_eq!(objects[1]["type"], "Parallax");
        assert!(objects.iter().all(|o| o.get("visible").is_none()));
        assert!(map.get("tilesets").is_none());
    }

    #[test]
    fn test_export_tileset_document() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("level.json");
        export(&level(), &base, &ExportOptions::default()).unwrap();

        let text = fs::read_to_string(dir.path().join("level.ts.json")).unwrap();
        let tilesets: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(tilesets["ground"]["image_filename"], "ground.png");
        assert_eq!(tilesets["ground"]["tile_size"]["w"], 16);
        assert_eq!(tilesets["ground"]["properties"]["friction"], 0.8);
        assert_eq!(tilesets["deco"]["tile_size"]["h"], 32);
    }

    #[test]
    fn test_export_names_are_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("level.json");
        export(&level(), &base, &ExportOptions::default()).unwrap();

        let map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&base).unwrap()).unwrap();
        let tilesets: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("level.ts.json")).unwrap())
                .unwrap();

        for tile in map["tiles"].as_array().unwrap() {
            let name = tile["tileset"].as_str().unwrap();
            let image = tilesets[name]["image_filename"].as_str().unwrap();
            let sheet = fs::read_to_string(
                dir.path().join(format!("level_{}.spritesheet.ron", name)),
            )
            .unwrap();
            assert!(sheet.contains(&format!("filename: \"{}\",", image)));
        }
    }

    #[test]
    fn test_export_spritesheet_contents() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("level.json");
        export(&level(), &base, &ExportOptions::default()).unwrap();

        let sheet =
            fs::read_to_string(dir.path().join("level_ground.spritesheet.ron")).unwrap();
        assert!(sheet.starts_with("(\n  filename: \"ground.png\",\n"));
        assert!(sheet.contains("  spritesheet_width:  64,\n  spritesheet_height: 32,\n"));
        assert_eq!(sheet.matches("      width:  16,").count(), 8);
        assert!(sheet.ends_with("  ],\n)\n"));
    }

    #[test]
    fn test_export_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("level.json");
        let doc = level();

        let first = export(&doc, &base, &ExportOptions::default()).unwrap();
        let contents: Vec<Vec<u8>> = first.written.iter().map(|p| fs::read(p).unwrap()).collect();

        let second = export(&doc, &base, &ExportOptions::default()).unwrap();
        assert_eq!(first, second);
        for (path, before) in second.written.iter().zip(contents) {
            assert_eq!(fs::read(path).unwrap(), before, "{} changed", path.display());
        }
    }

    #[test]
    fn test_export_duplicate_tileset_names() {
        let yaml = r#"
width: 1
height: 1
tile_width: 8
tile_height: 8
tilesets:
  - { name: dup, image: first.png, image_width: 8, image_height: 8, tile_width: 8, tile_height: 8 }
  - { name: dup, image: second.png, image_width: 16, image_height: 8, tile_width: 8, tile_height: 8 }
"#;
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("dup.json");
        let summary = export(&MapDocument::parse(yaml).unwrap(), &base, &ExportOptions::default())
            .unwrap();

        // Both spritesheets are written, to the same file; the later one wins.
        assert_eq!(summary.written.len(), 4);
        let tilesets = fs::read_to_string(dir.path().join("dup.ts.json")).unwrap();
        assert_eq!(
            tilesets,
            "{\"dup\": {\"image_filename\": \"second.png\", \"tile_size\": {\"w\": 8, \"h\": 8}, \"properties\": {}}}\n"
        );
        let sheet = fs::read_to_string(dir.path().join("dup_dup.spritesheet.ron")).unwrap();
        assert!(sheet.contains("second.png"));
    }

    #[test]
    fn test_export_write_failure_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("level.json");
        // A directory where the first spritesheet should go
        fs::create_dir(dir.path().join("level_ground.spritesheet.ron")).unwrap();

        let err = export(&level(), &base, &ExportOptions::default()).unwrap_err();

        match err {
            ExportError::Io { path, .. } => {
                assert_eq!(path, dir.path().join("level_ground.spritesheet.ron"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(base.exists());
        assert!(dir.path().join("level.ts.json").exists());
        assert!(!dir.path().join("level_deco.spritesheet.ron").exists());
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("missing").join("level.json");

        let result = export(&level(), &base, &ExportOptions::default());
        assert!(matches!(result, Err(ExportError::Io { .. })));
    }

    #[test]
    fn test_export_fractional_object_position() {
        let yaml = r#"
width: 2
height: 2
tile_width: 8
tile_height: 8
layers:
  - type: objects
    objects:
      - { type: Coin, x: 12.5, y: 3.25, width: 4, height: 4 }
      - { type: Door, x: 4, y: 8, width: 8, height: 8 }
"#;
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("coins.json");
        export(&MapDocument::parse(yaml).unwrap(), &base, &ExportOptions::default()).unwrap();

        assert_eq!(
            fs::read_to_string(&base).unwrap(),
            concat!(
                "{\"tiles\": [], \"objects\": [",
                "{\"name\": \"\", \"type\": \"Coin\", \"pos\": {\"x\": 12.5, \"y\": 12.75}, ",
                "\"size\": {\"w\": 4, \"h\": 4}, \"properties\": {}}, ",
                "{\"name\": \"\", \"type\": \"Door\", \"pos\": {\"x\": 4, \"y\": 8}, ",
                "\"size\": {\"w\": 8, \"h\": 8}, \"properties\": {}}]}\n"
            )
        );
    }

    #[test]
    fn test_export_empty_map() {
        let doc = MapDocument::parse("width: 0\nheight: 0\ntile_width: 16\ntile_height: 16\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("empty.json");

        let summary = export(&doc, &base, &ExportOptions::default()).unwrap();

        assert_eq!(summary.written.len(), 2);
        assert_eq!(fs::read_to_string(&base).unwrap(), "{\"tiles\": [], \"objects\": []}\n");
        assert_eq!(fs::read_to_string(dir.path().join("empty.ts.json")).unwrap(), "{}\n");
    }
}
