//! Output filenames derived from the base map path.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

const JSON_EXTENSION: &str = "json";
const TILESET_SUFFIX: &str = ".ts.json";
const SPRITESHEET_SUFFIX: &str = ".spritesheet.ron";

/// Every output location for one export run.
///
/// Given `level.json`: the map goes to `level.json`, tilesets to
/// `level.ts.json`, and each tileset's sheet to
/// `level_<tileset>.spritesheet.ron`. Only a trailing `.json` is replaced;
/// without one, suffixes are appended to the full path. Paths are never
/// converted to text, so non-UTF-8 names survive unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub map: PathBuf,
    pub tilesets: PathBuf,
    stem: OsString,
}

impl OutputPaths {
    pub fn new(base: &Path) -> Self {
        let stem = if base.extension() == Some(OsStr::new(JSON_EXTENSION)) {
            base.with_extension("").into_os_string()
        } else {
            base.as_os_str().to_os_string()
        };

        Self {
            map: base.to_path_buf(),
            tilesets: with_suffix(&stem, &[TILESET_SUFFIX]),
            stem,
        }
    }

    /// Spritesheet file for the tileset called `name`.
    pub fn spritesheet(&self, name: &str) -> PathBuf {
        with_suffix(&self.stem, &["_", name, SPRITESHEET_SUFFIX])
    }
}

fn with_suffix(stem: &OsStr, parts: &[&str]) -> PathBuf {
    let mut path = stem.to_os_string();
    for part in parts {
        path.push(part);
    }
    PathBuf::from(path)
}
