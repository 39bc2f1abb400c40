//! Vertical allocator: builds a resident profile once, then expands fields
//! sector by sector and stacks the results.

pub mod sector;

pub use sector::{ResolvedSector, Sector, SectorAssignment, SectorVariables, parse_sector_arg};

use crate::config::AllocationConfig;
use crate::error::{Error, Result};
use crate::field::{self, FieldFormat, GriddedField, SaveOptions, TSTEP};
use crate::table::{self, VerticalAllocationTable};
use crate::vertical::{self, ColumnKeys, GridSpec, InterpolatedProfile};
use std::path::{Path, PathBuf};

/// Indicator column: 1 on the first output layer, 0 elsewhere.
pub const LAYER1: &str = "LAYER1";

pub const DEFAULT_TABLE_VGTOP: f64 = 5000.0;

#[derive(Debug, Clone)]
pub struct AllocatorOptions {
    /// Top pressure used when deriving the table's pressure column from sigma.
    pub table_vgtop: f64,
    pub keys: ColumnKeys,
    /// Drop layers that receive no weight from any sector (layer 1 is always kept).
    pub prune: bool,
}

impl Default for AllocatorOptions {
    fn default() -> Self {
        Self {
            table_vgtop: DEFAULT_TABLE_VGTOP,
            keys: ColumnKeys::for_allocation(vertical::DEFAULT_SIGMA_KEY, vertical::DEFAULT_PRESSURE_KEY),
            prune: true,
        }
    }
}

/// Holds the interpolated, pruned profile for one target grid.
///
/// Immutable after construction; `allocate` never mutates its input, so
/// one allocator can serve any number of calls.
#[derive(Debug, Clone)]
pub struct VerticalAllocator {
    grid: GridSpec,
    profile: InterpolatedProfile,
}

impl VerticalAllocator {
    pub fn new(
        mut table: VerticalAllocationTable,
        grid: GridSpec,
        opts: &AllocatorOptions,
    ) -> Result<Self> {
        let keys = &opts.keys;
        if !table.contains(&keys.pressure) {
            tracing::info!(
                sigma = %keys.sigma,
                top = opts.table_vgtop,
                surface = grid.psfc(),
                "deriving table pressure from sigma"
            );
            vertical::derive_pressure_in_place(
                &mut table,
                &keys.sigma,
                &keys.pressure,
                opts.table_vgtop,
                grid.psfc(),
            )?;
        }

        let mut profile = vertical::interpolate(&table, &grid, keys)?;

        let nlays = profile.nlays();
        let layer1 = (0..nlays).map(|k| if k == 0 { 1.0 } else { 0.0 }).collect();
        profile.set_column(LAYER1, layer1)?;

        let mut used: Vec<bool> = profile
            .table()
            .row_sums_excluding(&keys.meta)
            .into_iter()
            .map(|s| s > 0.0)
            .collect();
        if let Some(first) = used.first_mut() {
            *first = true;
        }
        if !opts.prune {
            used.iter_mut().for_each(|u| *u = true);
        }
        profile.retain_rows(&used);

        tracing::info!(
            target_layers = nlays,
            kept = profile.nlays(),
            inverted = profile.inverted(),
            "built vertical profile"
        );
        Ok(Self { grid, profile })
    }

    /// Load the table named by `cfg` and build the allocator.
    pub fn from_config(cfg: &AllocationConfig) -> Result<Self> {
        let table = table::load_table(&cfg.table, &cfg.parse)?;
        Self::new(table, cfg.grid()?, &cfg.allocator_options())
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn profile(&self) -> &InterpolatedProfile {
        &self.profile
    }

    /// `VGLVLS` of every allocated field: the surface edge plus the kept layer tops.
    pub fn output_vglvls(&self) -> Result<Vec<f64>> {
        Ok(std::iter::once(self.grid.surface_edge())
            .chain(self.profile.sigma()?.iter().copied())
            .collect())
    }

    /// Expand every sector's variables and stack the parts along `TSTEP`
    /// in declaration order.
    pub fn allocate(
        &self,
        field: &GriddedField,
        assignment: &SectorAssignment,
    ) -> Result<GriddedField> {
        let eligible = field.eligible_variables();
        let resolved = assignment.resolve(&eligible);

        for s in &resolved {
            self.profile.fractions(&s.name)?;
        }

        let mut parts = Vec::with_capacity(resolved.len());
        for s in &resolved {
            if s.variables.is_empty() {
                tracing::warn!(sector = %s.name, "sector has no variables; skipping");
                continue;
            }
            let total: f64 = self.profile.fractions(&s.name)?.iter().sum();
            if total == 0.0 {
                tracing::warn!(sector = %s.name, "sector profile is empty; output will be zero");
            }
            let sub = field.subset(&s.variables)?;
            parts.push(field::expand_with_profile(
                &sub,
                &self.profile,
                &s.name,
                self.grid.surface_edge(),
            )?);
            tracing::debug!(sector = %s.name, variables = s.variables.len(), "allocated sector");
        }

        let Some((first, rest)) = parts.split_first() else {
            return Err(Error::InvalidConfig(
                "no variables to allocate in any sector".into(),
            ));
        };
        let out = first.stack(rest, TSTEP)?;
        out.check_vertical_metadata()?;
        Ok(out)
    }

    /// Open `input`, allocate it, and save the result to `output`.
    pub fn allocate_file(
        &self,
        input: &Path,
        format: FieldFormat,
        assignment: &SectorAssignment,
        output: &Path,
        save: &SaveOptions,
    ) -> Result<PathBuf> {
        let field = field::open_field(input, format)?;
        let out = self.allocate(&field, assignment)?;
        field::save_field(&out, output, save)
    }
}
