use crate::error::{Error, Result};
use crate::table::VerticalAllocationTable;
use crate::vertical::ColumnKeys;
use crate::vertical::grid::GridSpec;

/// An allocation table reindexed onto the layers of a target grid.
///
/// Row `k` describes target layer `k`; the sigma column holds that layer's top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedProfile {
    table: VerticalAllocationTable,
    sigma_key: String,
    inverted: bool,
}

impl InterpolatedProfile {
    pub fn table(&self) -> &VerticalAllocationTable {
        &self.table
    }

    pub fn nlays(&self) -> usize {
        self.table.nrows()
    }

    /// True when the source rows had to be reversed to interpolate.
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn sigma(&self) -> Result<&[f64]> {
        self.table.require(&self.sigma_key)
    }

    /// Per-layer fractions of one sector.
    pub fn fractions(&self, sector: &str) -> Result<&[f64]> {
        self.table
            .column(sector)
            .ok_or_else(|| Error::UnknownSector(sector.to_string()))
    }

    pub(crate) fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.table.set_column(name, values)
    }

    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        self.table = self.table.filter_rows(keep);
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`, with `xp` non-decreasing.
///
/// Left of `xp[0]` the result is 0; right of the last point it holds the
/// last value.
pub fn interp_left_zero(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if x.is_nan() || xp.is_empty() {
        return f64::NAN;
    }
    if x < xp[0] {
        return 0.0;
    }
    let last = xp.len() - 1;
    if x >= xp[last] {
        return fp[last];
    }
    // xp[j] <= x < xp[j + 1]
    let j = xp.partition_point(|&v| v <= x) - 1;
    let (x0, x1) = (xp[j], xp[j + 1]);
    fp[j] + (fp[j + 1] - fp[j]) * (x - x0) / (x1 - x0)
}

/// Divide by the series sum so it totals 1. An all-zero series stays zero.
pub fn renormalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        values.iter_mut().for_each(|v| *v = 0.0);
    } else {
        values.iter_mut().for_each(|v| *v /= total);
    }
}

/// Interpolate every column of `table` onto the layer tops of `grid`.
///
/// Source levels are located by the pressure column, normalized with the
/// grid's `vgtop` and `psfc`. Columns not listed in `keys.meta` are
/// renormalized to sum to 1 over the target layers, and the sigma column is
/// replaced by the target layer tops.
pub fn interpolate(
    table: &VerticalAllocationTable,
    grid: &GridSpec,
    keys: &ColumnKeys,
) -> Result<InterpolatedProfile> {
    if table.nrows() == 0 {
        return Err(Error::InvalidConfig("allocation table has no rows".into()));
    }
    let x = grid.layer_tops();

    let mut xp: Vec<f64> = table
        .require(&keys.pressure)?
        .iter()
        .map(|&p| grid.normalize(p))
        .collect();

    // Tables are normally stored surface first, so pressure decreases along the rows.
    let inverted = xp[xp.len() - 1] < xp[0];
    if inverted {
        xp.reverse();
    }
    if !xp.windows(2).all(|w| w[0] <= w[1]) {
        return Err(Error::NonMonotonic {
            column: keys.pressure.clone(),
        });
    }

    let mut out = VerticalAllocationTable::new();
    for col in table.columns() {
        let mut fp = col.values.clone();
        if inverted {
            fp.reverse();
        }
        let mut values: Vec<f64> = x.iter().map(|&xi| interp_left_zero(xi, &xp, &fp)).collect();
        if !keys.is_meta(&col.name) {
            renormalize(&mut values);
        }
        tracing::trace!(column = %col.name, ?values, "interpolated");
        out.set_column(col.name.clone(), values)?;
    }
    out.set_column(keys.sigma.clone(), x.to_vec())?;

    tracing::debug!(
        layers = out.nrows(),
        columns = out.ncols(),
        inverted,
        "interpolated allocation table"
    );
    Ok(InterpolatedProfile {
        table: out,
        sigma_key: keys.sigma.clone(),
        inverted,
    })
}
