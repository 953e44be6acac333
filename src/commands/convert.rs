use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::emit;
use crate::admin::document::{to_pretty_json, Record};
use crate::cli::ConvertCommand;
use crate::convert::{add_image_field, array_literal_to_records, sheet_to_records};
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertReport {
    pub items: usize,
    /// Items changed in place; only set by `add-image`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<usize>,
    /// `None` when the JSON went to stdout.
    pub output: Option<PathBuf>,
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.output, self.changed) {
            (Some(path), Some(changed)) => writeln!(
                f,
                "{changed} of {} items updated in {}",
                self.items,
                path.display()
            ),
            (Some(path), None) => writeln!(f, "{} items written to {}", self.items, path.display()),
            (None, _) => Ok(()),
        }
    }
}

fn write_records(records: &[Record], output: Option<&Path>) -> Result<()> {
    let json = to_pretty_json(records)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)?;
            tracing::info!("wrote {} items to {}", records.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Converts `input` and writes the array to `output`, or returns it as text
/// when no output file is given.
pub fn convert_file(
    input: &Path,
    output: Option<&Path>,
    parse: fn(&str) -> Result<Vec<Record>>,
) -> Result<ConvertReport> {
    let text = std::fs::read_to_string(input)?;
    let records = parse(&text)?;
    write_records(&records, output)?;
    Ok(ConvertReport {
        items: records.len(),
        changed: None,
        output: output.map(Path::to_path_buf),
    })
}

/// Adds missing `Imagen` fields to a JSON array file and rewrites it.
pub fn add_images_in_place(file: &Path) -> Result<ConvertReport> {
    let text = std::fs::read_to_string(file)?;
    let mut records: Vec<Record> = serde_json::from_str(&text)?;
    let changed = add_image_field(&mut records);
    write_records(&records, Some(file))?;
    Ok(ConvertReport {
        items: records.len(),
        changed: Some(changed),
        output: Some(file.to_path_buf()),
    })
}

pub fn run(cmd: ConvertCommand, json: bool) -> Result<()> {
    let report = match cmd {
        ConvertCommand::Sheet { input, output } => {
            convert_file(&input, output.as_deref(), sheet_to_records)?
        }
        ConvertCommand::Literal { input, output } => {
            convert_file(&input, output.as_deref(), array_literal_to_records)?
        }
        ConvertCommand::AddImage { file } => add_images_in_place(&file)?,
    };
    // Converted JSON already went to stdout; don't mix a report into it.
    if report.output.is_some() {
        emit(json, &report)?;
    }
    Ok(())
}
