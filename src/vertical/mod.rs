//! Vertical coordinate handling: target grids, sigma-to-pressure derivation,
//! and interpolation of allocation profiles onto a target grid.

pub mod grid;
pub mod interp;
pub mod pressure;

pub use grid::GridSpec;
pub use interp::{InterpolatedProfile, interpolate};
pub use pressure::{derive_pressure, derive_pressure_in_place, sigma_to_pressure};

pub const DEFAULT_SIGMA_KEY: &str = "Sigma";
pub const DEFAULT_PRESSURE_KEY: &str = "Pressure";

/// Column roles in an allocation table.
///
/// `meta` columns are carried through interpolation but never renormalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnKeys {
    pub sigma: String,
    pub pressure: String,
    pub meta: Vec<String>,
}

impl Default for ColumnKeys {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA_KEY.to_string(),
            pressure: DEFAULT_PRESSURE_KEY.to_string(),
            meta: vec![DEFAULT_SIGMA_KEY.into(), "Alt".into(), "L".into()],
        }
    }
}

impl ColumnKeys {
    /// Keys used by the allocator: pressure joins the meta columns.
    pub fn for_allocation(sigma: &str, pressure: &str) -> Self {
        Self {
            sigma: sigma.to_string(),
            pressure: pressure.to_string(),
            meta: vec![sigma.into(), pressure.into(), "Alt".into(), "L".into()],
        }
    }

    pub fn is_meta(&self, name: &str) -> bool {
        self.meta.iter().any(|m| m == name)
    }
}
