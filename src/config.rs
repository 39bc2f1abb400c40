//! Allocation job configuration.
//!
//! A job file is JSON:
//! ```json
//! {
//!   "table": "vertical_allocation.csv",
//!   "vglvls": [1.0, 0.995, 0.99, 0.985, 0.98],
//!   "vgtop": 5000.0,
//!   "sectors": [
//!     { "name": "ptegu", "variables": ["NO", "NO2", "SO2"] },
//!     { "name": "ground" }
//!   ]
//! }
//! ```
//! A sector without `variables` (or with `null`) takes every layered
//! variable no other sector lists. Relative `table` paths resolve against
//! the job file's directory.

use crate::allocator::{AllocatorOptions, DEFAULT_TABLE_VGTOP, Sector, SectorAssignment};
use crate::error::{Error, Result};
use crate::field::{FieldFormat, SaveOptions};
use crate::table::ParseOptions;
use crate::vertical::{self, ColumnKeys, GridSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PSFC: f64 = 101325.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConfig {
    pub name: String,
    #[serde(default)]
    pub variables: Option<Vec<String>>,
}

impl From<&SectorConfig> for Sector {
    fn from(cfg: &SectorConfig) -> Self {
        match &cfg.variables {
            Some(vars) => Sector::explicit(cfg.name.clone(), vars.iter().cloned()),
            None => Sector::default_remainder(cfg.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Vertical allocation table (delimited text).
    pub table: PathBuf,

    #[serde(default)]
    pub parse: ParseOptions,

    /// Target `VGLVLS`: `nlays + 1` sigma edges, surface first.
    pub vglvls: Vec<f64>,

    /// Target model top (Pa).
    pub vgtop: f64,

    #[serde(default = "default_psfc")]
    pub psfc: f64,

    /// Top pressure the table's sigma values were built with.
    #[serde(default = "default_table_vgtop")]
    pub table_vgtop: f64,

    #[serde(default = "default_sigma_column")]
    pub sigma_column: String,

    #[serde(default = "default_pressure_column")]
    pub pressure_column: String,

    /// Columns never renormalized. Defaults to sigma, pressure, `Alt`, `L`.
    #[serde(default)]
    pub meta_columns: Option<Vec<String>>,

    #[serde(default = "default_prune")]
    pub prune: bool,

    #[serde(default)]
    pub sectors: Vec<SectorConfig>,

    #[serde(default)]
    pub input_format: FieldFormat,

    #[serde(default)]
    pub save: SaveOptions,
}

fn default_psfc() -> f64 {
    DEFAULT_PSFC
}
fn default_table_vgtop() -> f64 {
    DEFAULT_TABLE_VGTOP
}
fn default_sigma_column() -> String {
    vertical::DEFAULT_SIGMA_KEY.into()
}
fn default_pressure_column() -> String {
    vertical::DEFAULT_PRESSURE_KEY.into()
}
fn default_prune() -> bool {
    true
}

impl AllocationConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut cfg: Self = serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if cfg.table.is_relative() {
            if let Some(dir) = path.parent() {
                cfg.table = dir.join(&cfg.table);
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid()?;
        if !(self.psfc > self.table_vgtop) {
            return Err(Error::InvalidConfig(format!(
                "psfc {} must exceed table_vgtop {}",
                self.psfc, self.table_vgtop
            )));
        }
        if !self.sectors.is_empty() {
            self.sector_assignment()?;
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<GridSpec> {
        GridSpec::new(self.vglvls.clone(), self.vgtop, self.psfc)
    }

    pub fn column_keys(&self) -> ColumnKeys {
        let mut keys = ColumnKeys::for_allocation(&self.sigma_column, &self.pressure_column);
        if let Some(meta) = &self.meta_columns {
            keys.meta = meta.clone();
        }
        keys
    }

    pub fn allocator_options(&self) -> AllocatorOptions {
        AllocatorOptions {
            table_vgtop: self.table_vgtop,
            keys: self.column_keys(),
            prune: self.prune,
        }
    }

    pub fn sector_assignment(&self) -> Result<SectorAssignment> {
        SectorAssignment::new(self.sectors.iter().map(Sector::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<AllocationConfig> {
        let cfg: AllocationConfig = serde_json::from_str(text).unwrap();
        cfg.validate()?;
        Ok(cfg)
    }

    #[test]
    fn defaults_fill_in() {
        let cfg = parse(r#"{"table": "va.csv", "vglvls": [1.0, 0.9, 0.0], "vgtop": 5000}"#).unwrap();
        assert_eq!(cfg.psfc, 101325.0);
        assert_eq!(cfg.table_vgtop, 5000.0);
        assert!(cfg.prune);
        assert_eq!(cfg.parse, ParseOptions::default());
        assert_eq!(
            cfg.column_keys().meta,
            vec!["Sigma", "Pressure", "Alt", "L"]
        );
        assert_eq!(cfg.save.compression_level, 1);
    }

    #[test]
    fn meta_columns_override_replaces_defaults() {
        let cfg = parse(
            r#"{"table": "va.csv", "vglvls": [1.0, 0.0], "vgtop": 5000,
                "sigma_column": "SIG", "meta_columns": ["SIG", "Pressure", "Height"]}"#,
        )
        .unwrap();
        let keys = cfg.allocator_options().keys;
        assert_eq!(keys.sigma, "SIG");
        assert_eq!(keys.meta, vec!["SIG", "Pressure", "Height"]);
        assert!(keys.is_meta("Height"));
        assert!(!keys.is_meta("Alt"));
    }

    #[test]
    fn sectors_keep_declaration_order() {
        let cfg = parse(
            r#"{"table": "va.csv", "vglvls": [1.0, 0.0], "vgtop": 5000,
                "sectors": [{"name": "onroad", "variables": ["NOX"]},
                            {"name": "other", "variables": null}]}"#,
        )
        .unwrap();
        let a = cfg.sector_assignment().unwrap();
        assert_eq!(
            a.sectors(),
            &[
                Sector::explicit("onroad", ["NOX"]),
                Sector::default_remainder("other")
            ]
        );
    }

    #[test]
    fn two_default_sectors_fail_validation() {
        let err = parse(
            r#"{"table": "va.csv", "vglvls": [1.0, 0.0], "vgtop": 5000,
                "sectors": [{"name": "a"}, {"name": "b"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MultipleDefaultSectors(_)));
    }

    #[test]
    fn relative_table_resolves_against_job_dir() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.json");
        std::fs::write(&job, r#"{"table": "va.csv", "vglvls": [1.0, 0.0], "vgtop": 5000}"#)
            .unwrap();
        let cfg = AllocationConfig::load_from(&job).unwrap();
        assert_eq!(cfg.table, dir.path().join("va.csv"));
    }
}
