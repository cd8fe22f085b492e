//! Export command implementation.
//!
//! Loads each map document and writes its map, tileset and spritesheet
//! files into the output directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::{ExportOptions, CONFIG_FILENAME};
use crate::coords::Origin;
use crate::document::MapDocument;
use crate::error::{ExportError, Result};
use crate::export::{export, ExportSummary};
use crate::output::{display_path, plural, Printer};

/// Export map documents to map, tileset and spritesheet files
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Map documents to export (.yaml, .yml or .json)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output directory
    #[arg(long, short, default_value = "dist")]
    pub output: PathBuf,

    /// Options file (defaults to tilemap-export.yaml next to each map)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Origin of exported positions
    #[arg(long, value_enum)]
    pub origin: Option<Origin>,

    /// Property key exported as a list of strings
    #[arg(long)]
    pub list_key: Option<String>,
}

pub fn run(args: ExportArgs) -> Result<()> {
    let printer = Printer::new();

    if !args.output.exists() {
        fs::create_dir_all(&args.output).map_err(|e| ExportError::Io {
            path: args.output.clone(),
            message: format!("Failed to create output directory: {}", e),
        })?;
    }

    let mut total_files = 0;
    for file in &args.files {
        let summary = export_file(file, &args, &printer)?;
        total_files += summary.written.len();
    }

    printer.status(
        "Finished",
        &format!(
            "{} from {} into {}",
            plural(total_files, "file", "files"),
            plural(args.files.len(), "map", "maps"),
            display_path(&args.output)
        ),
    );

    Ok(())
}

fn export_file(file: &Path, args: &ExportArgs, printer: &Printer) -> Result<ExportSummary> {
    printer.status("Exporting", &display_path(file));

    let options = resolve_options(file, args)?;
    let document = MapDocument::load(file)?;

    let mut seen = HashSet::new();
    for tileset in &document.tilesets {
        if !seen.insert(tileset.name.as_str()) {
            printer.warning(
                "Duplicate",
                &format!("tileset name '{}', the later tileset wins", tileset.name),
            );
        }
    }

    let base = output_base(file, &args.output);
    if is_same_file(file, &base) {
        return Err(ExportError::Io {
            path: base,
            message: "Export would overwrite the input map".to_string(),
        });
    }

    let summary = export(&document, &base, &options)?;
    for path in &summary.written {
        printer.info("Writing", &display_path(path));
    }

    let mut counts = vec![
        plural(summary.tiles, "tile", "tiles"),
        plural(summary.objects, "object", "objects"),
        plural(summary.tilesets, "tileset", "tilesets"),
    ];
    if summary.hidden_objects > 0 {
        counts.push(printer.dim(&format!("{} hidden", summary.hidden_objects)));
    }
    printer.status("Exported", &counts.join(", "));

    Ok(summary)
}

/// Options from `--config`, else a config file beside the map, then flags.
fn resolve_options(file: &Path, args: &ExportArgs) -> Result<ExportOptions> {
    let mut options = match &args.config {
        Some(path) => ExportOptions::load(path)?,
        None => {
            let beside = file
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(CONFIG_FILENAME);
            if beside.is_file() {
                ExportOptions::load(&beside)?
            } else {
                ExportOptions::default()
            }
        }
    };

    if let Some(origin) = args.origin {
        options.origin = origin;
    }
    if let Some(key) = &args.list_key {
        options.list_key = key.clone();
    }
    Ok(options)
}

/// Whether `target` names the existing file `input`, however either is spelled.
fn is_same_file(input: &Path, target: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(target)) {
        (Ok(input), Ok(target)) => input == target,
        _ => false,
    }
}

/// `<output>/<name>.json` for a map file named `<name>[.map].<ext>`.
fn output_base(file: &Path, output: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("map");
    let name = stem.strip_suffix(".map").unwrap_or(stem);
    output.join(format!("{}.json", name))
}
