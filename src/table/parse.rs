use crate::error::{Error, Result};
use crate::table::frame::VerticalAllocationTable;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Options handed verbatim to the delimited-text reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Lines starting with this character are skipped. `None` disables comments.
    pub comment: Option<char>,
    pub delimiter: char,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            comment: Some('#'),
            delimiter: ',',
        }
    }
}

fn ascii_byte(c: char, what: &str) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(Error::InvalidConfig(format!("{} must be ASCII, got {:?}", what, c)))
    }
}

/// Parse a vertical allocation file into a table.
///
/// Expected shape (comma-separated, header first):
/// ```text
/// # optional comments
/// L,Sigma,Alt,elevated,ground
/// 1,0.995,38,0.0,1.0
/// ```
/// Every cell must be numeric.
pub fn load_table(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<VerticalAllocationTable> {
    let path = path.as_ref();
    let csv_err = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let comment = opts
        .comment
        .map(|c| ascii_byte(c, "comment prefix"))
        .transpose()?;
    let mut rdr = ReaderBuilder::new()
        .comment(comment)
        .delimiter(ascii_byte(opts.delimiter, "delimiter")?)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        for ((cell, name), out) in record.iter().zip(&headers).zip(values.iter_mut()) {
            let v: f64 = cell.parse().map_err(|_| Error::Parse {
                path: path.to_path_buf(),
                line,
                column: name.clone(),
                value: cell.to_string(),
            })?;
            out.push(v);
        }
    }

    let table = VerticalAllocationTable::from_columns(headers.into_iter().zip(values))?;
    tracing::debug!(
        path = %path.display(),
        rows = table.nrows(),
        columns = table.ncols(),
        "loaded allocation table"
    );
    Ok(table)
}

/// Write a table as comma-separated text; `None` writes to stdout.
pub fn write_table(table: &VerticalAllocationTable, dest: Option<&Path>) -> Result<()> {
    let label = dest.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("-"));
    let csv_err = |source| Error::Csv {
        path: label.clone(),
        source,
    };

    let sink: Box<dyn io::Write> = match dest {
        Some(p) => Box::new(std::fs::File::create(p).map_err(|e| Error::io(p, e))?),
        None => Box::new(io::stdout().lock()),
    };
    let mut wtr = WriterBuilder::new().from_writer(sink);

    wtr.write_record(table.column_names()).map_err(csv_err)?;
    for row in 0..table.nrows() {
        wtr.write_record(table.columns().iter().map(|c| c.values[row].to_string()))
            .map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| Error::io(&label, e))?;
    Ok(())
}
