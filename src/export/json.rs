//! JSON output.
//!
//! Map and tileset documents are written on a single line with `", "` and
//! `": "` separators, followed by a newline. Field order follows the record
//! structs; property maps are sorted by key. Output is pure ASCII: anything
//! outside printable ASCII is written as `\uXXXX` escapes, and floats use
//! the shortest round-trip form with a `1e+20` style exponent.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::Formatter;
use tracing::warn;

use crate::error::{ExportError, Result};
use crate::records::{ObjectRecord, TileRecord, TilesetRecord};

use super::write_text;

/// Compact JSON with a space after each separator.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_text(value).as_bytes())
    }
}

/// Shortest round-trip text of a finite float.
///
/// Decimal notation is used for exponents in `-4..16`, always with a
/// fractional part. Outside that range the exponent carries a sign and at
/// least two digits: `1e+20`, `1.5e-07`.
fn float_text(value: f64) -> String {
    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let mut out = String::from(sign);
    if (-4..16).contains(&exponent) {
        if exponent >= 0 {
            let whole = exponent as usize + 1;
            if digits.len() <= whole {
                out.push_str(&digits);
                out.push_str(&"0".repeat(whole - digits.len()));
                out.push_str(".0");
            } else {
                out.push_str(&digits[..whole]);
                out.push('.');
                out.push_str(&digits[whole..]);
            }
        } else {
            out.push_str("0.");
            out.push_str(&"0".repeat((-exponent - 1) as usize));
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        let exponent_sign = if exponent < 0 { '-' } else { '+' };
        out.push_str(&format!("e{}{:02}", exponent_sign, exponent.abs()));
    }
    out
}

/// Serialize `value` into a single line of JSON terminated by a newline.
pub fn to_json_line<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ExportError::Serialize {
            message: format!("Failed to serialize JSON: {}", e),
        })?;

    let mut text = String::from_utf8(buf).map_err(|e| ExportError::Serialize {
        message: format!("JSON output is not UTF-8: {}", e),
    })?;
    text.push('\n');
    Ok(text)
}

/// Write `value` as a single-line JSON document.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let text = to_json_line(value)?;
    write_text(path, &text)
}

/// The map document: placed tiles and visible objects.
#[derive(Debug, serde::Serialize)]
pub struct MapData<'a> {
    pub tiles: &'a [TileRecord],
    pub objects: Vec<&'a ObjectRecord>,
}

impl<'a> MapData<'a> {
    /// Assemble the map document, dropping hidden objects.
    pub fn assemble(tiles: &'a [TileRecord], objects: &'a [ObjectRecord]) -> Self {
        Self {
            tiles,
            objects: objects.iter().filter(|o| o.visible).collect(),
        }
    }
}

/// The tileset document: tileset name to tileset data.
///
/// Names keep the position of their first appearance; a repeated name
/// replaces the earlier data.
#[derive(Debug, Default)]
pub struct TilesetDocument<'a> {
    entries: Vec<&'a TilesetRecord>,
    positions: HashMap<&'a str, usize>,
}

impl<'a> TilesetDocument<'a> {
    pub fn assemble(tilesets: &'a [TilesetRecord]) -> Self {
        let mut document = Self::default();
        for tileset in tilesets {
            if document.insert(tileset) {
                warn!(tileset = %tileset.name, "duplicate tileset name, the later tileset wins");
            }
        }
        document
    }

    /// Insert a tileset, returning `true` if it replaced one with the same name.
    pub fn insert(&mut self, tileset: &'a TilesetRecord) -> bool {
        match self.positions.get(tileset.name.as_str()) {
            Some(&idx) => {
                self.entries[idx] = tileset;
                true
            }
            None => {
                self.positions.insert(tileset.name.as_str(), self.entries.len());
                self.entries.push(tileset);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TilesetRecord> {
        self.positions.get(name).map(|&idx| self.entries[idx])
    }
}

impl Serialize for TilesetDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for tileset in &self.entries {
            map.serialize_entry(&tileset.name, tileset)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ObjectPosition, Position};
    use crate::properties::{Properties, PropertyValue};
    use crate::records::Size;
    use pretty_assertions::assert_eq;

    fn tileset(name: &str, image: &str) -> TilesetRecord {
        TilesetRecord {
            name: name.to_string(),
            image_filename: image.to_string(),
            tile_size: Size::new(16, 16),
            properties: Properties::new(),
            image_width: 64,
            image_height: 32,
        }
    }

    fn object(name: &str, visible: bool) -> ObjectRecord {
        ObjectRecord {
            name: name.to_string(),
            object_type: "Parallax".to_string(),
            pos: ObjectPosition::new(0.0, 10.0),
            size: Size::new(4, 4),
            properties: Properties::new(),
            visible,
        }
    }

    #[test]
    fn test_json_line_spacing() {
        let mut props = Properties::new();
        props.insert("solid".into(), PropertyValue::Boolean(true));
        props.insert("tags".into(), PropertyValue::StringList(vec!["a".into(), "b".into()]));

        let text = to_json_line(&props).unwrap();
        assert_eq!(text, "{\"solid\": true, \"tags\": [\"a\", \"b\"]}\n");
    }

    #[test]
    fn test_json_line_escapes_non_ascii() {
        let mut props = Properties::new();
        props.insert("label".into(), PropertyValue::String("café".into()));
        props.insert("icon".into(), PropertyValue::String("a😀\u{7f}".into()));
        props.insert("quote".into(), PropertyValue::String("say \"hi\"\n".into()));

        let text = to_json_line(&props).unwrap();
        assert_eq!(
            text,
            "{\"icon\": \"a\\ud83d\\ude00\\u007f\", \"label\": \"caf\\u00e9\", \"quote\": \"say \\\"hi\\\"\\n\"}\n"
        );
        assert!(text.is_ascii());
    }

    #[test]
    fn test_float_text() {
        assert_eq!(float_text(3.14), "3.14");
        assert_eq!(float_text(2.0), "2.0");
        assert_eq!(float_text(-0.5), "-0.5");
        assert_eq!(float_text(0.0), "0.0");
        assert_eq!(float_text(0.0001), "0.0001");
        assert_eq!(float_text(0.00001), "1e-05");
        assert_eq!(float_text(1.5e-7), "1.5e-07");
        assert_eq!(float_text(1234567890123456.0), "1234567890123456.0");
        assert_eq!(float_text(1e16), "1e+16");
        assert_eq!(float_text(1e20), "1e+20");
        assert_eq!(float_text(-2.5e300), "-2.5e+300");
    }

    #[test]
    fn test_json_line_floats() {
        let mut props = Properties::new();
        props.insert("big".into(), PropertyValue::Float(1e39));
        props.insert("z".into(), PropertyValue::Float(0.8));

        let text = to_json_line(&props).unwrap();
        assert_eq!(text, "{\"big\": 1e+39, \"z\": 0.8}\n");
    }

    #[test]
    fn test_json_line_empty_containers() {
        let data = MapData::assemble(&[], &[]);
        assert_eq!(to_json_line(&data).unwrap(), "{\"tiles\": [], \"objects\": []}\n");
    }

    #[test]
    fn test_map_data_drops_hidden_objects() {
        let objects = vec![object("a", true), object("b", false), object("c", true)];
        let data = MapData::assemble(&[], &objects);

        let names: Vec<&str> = data.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_map_data_json() {
        let tiles = vec![TileRecord {
            id: 3,
            pos: Position::new(16, 32),
            tileset: "ground".to_string(),
            properties: Properties::new(),
        }];
        let objects = vec![object("bg", true)];

        let text = to_json_line(&MapData::assemble(&tiles, &objects)).unwrap();
        assert_eq!(
            text,
            concat!(
                "{\"tiles\": [{\"id\": 3, \"pos\": {\"x\": 16, \"y\": 32}, \"tileset\": \"ground\", \"properties\": {}}], ",
                "\"objects\": [{\"name\": \"bg\", \"type\": \"Parallax\", \"pos\": {\"x\": 0, \"y\": 10}, ",
                "\"size\": {\"w\": 4, \"h\": 4}, \"properties\": {}}]}\n"
            )
        );
    }

    #[test]
    fn test_tileset_document_keeps_source_order() {
        let tilesets = vec![tileset("zeta", "z.png"), tileset("alpha", "a.png")];
        let document = TilesetDocument::assemble(&tilesets);

        let text = to_json_line(&document).unwrap();
        assert_eq!(
            text,
            concat!(
                "{\"zeta\": {\"image_filename\": \"z.png\", \"tile_size\": {\"w\": 16, \"h\": 16}, \"properties\": {}}, ",
                "\"alpha\": {\"image_filename\": \"a.png\", \"tile_size\": {\"w\": 16, \"h\": 16}, \"properties\": {}}}\n"
            )
        );
    }

    #[test]
    fn test_tileset_document_last_duplicate_wins() {
        let tilesets = vec![
            tileset("ground", "old.png"),
            tileset("sky", "sky.png"),
            tileset("ground", "new.png"),
        ];
        let document = TilesetDocument::assemble(&tilesets);

        assert_eq!(document.len(), 2);
        assert_eq!(document.get("ground").unwrap().image_filename, "new.png");

        let value: serde_json::Value =
            serde_json::from_str(&to_json_line(&document).unwrap()).unwrap();
        assert_eq!(value["ground"]["image_filename"], "new.png");
        assert_eq!(value["sky"]["image_filename"], "sky.png");
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_json(&vec![1, 2, 3], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1, 2, 3]\n");
    }
}
