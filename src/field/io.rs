//! Reading and writing gridded fields.

use crate::error::{Error, Result};
use crate::field::model::GriddedField;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Known on-disk layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldFormat {
    /// IOAPI-style metadata (`VGLVLS`, `NLAYS`, `VGTOP`, `TFLAG`) with
    /// variables serialized as JSON.
    #[default]
    IoapiJson,
}

impl FromStr for FieldFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ioapi-json" | "ioapi" | "json" => Ok(Self::IoapiJson),
            other => Err(Error::InvalidConfig(format!("unknown field format {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    pub format: FieldFormat,
    /// 0-9. The JSON layout has no codec, so this only gates validation.
    pub compression_level: u8,
    /// Remove an existing destination before writing.
    pub overwrite: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            format: FieldFormat::IoapiJson,
            compression_level: 1,
            overwrite: false,
        }
    }
}

pub fn open_field(path: impl AsRef<Path>, format: FieldFormat) -> Result<GriddedField> {
    let path = path.as_ref();
    let field: GriddedField = match format {
        FieldFormat::IoapiJson => {
            let file = File::open(path).map_err(|e| Error::io(path, e))?;
            serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
                path: path.to_path_buf(),
                source,
            })?
        }
    };
    field.validate()?;
    tracing::debug!(
        path = %path.display(),
        variables = field.variables.len(),
        nlays = field.nlays,
        "opened field"
    );
    Ok(field)
}

/// Persist `field` and return the written path.
///
/// An existing destination is an error unless `opts.overwrite` is set, in
/// which case it is removed first.
pub fn save_field(
    field: &GriddedField,
    path: impl AsRef<Path>,
    opts: &SaveOptions,
) -> Result<PathBuf> {
    let path = path.as_ref();
    if opts.compression_level > 9 {
        return Err(Error::InvalidConfig(format!(
            "compression level must be 0-9, got {}",
            opts.compression_level
        )));
    }
    field.check_vertical_metadata()?;

    if path.exists() {
        if opts.overwrite {
            tracing::info!(path = %path.display(), "removing existing output");
            fs::remove_file(path).map_err(|e| Error::io(path, e))?;
        } else {
            return Err(Error::io(
                path,
                std::io::Error::new(ErrorKind::AlreadyExists, "output exists; pass overwrite"),
            ));
        }
    }

    match opts.format {
        FieldFormat::IoapiJson => {
            let file = File::create(path).map_err(|e| Error::io(path, e))?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer(&mut w, field).map_err(|source| Error::Json {
                path: path.to_path_buf(),
                source,
            })?;
            w.flush().map_err(|e| Error::io(path, e))?;
        }
    }
    tracing::info!(path = %path.display(), nlays = field.nlays, "saved field");
    Ok(path.to_path_buf())
}
