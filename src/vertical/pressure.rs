use crate::error::Result;
use crate::table::VerticalAllocationTable;

/// `sigma * (surface - top) + top`
pub fn sigma_to_pressure(sigma: f64, top: f64, surface: f64) -> f64 {
    sigma * (surface - top) + top
}

/// Add (or overwrite) `pressure_key` on `table`, computed from `sigma_key`.
///
/// Older allocation files were usually derived with `top = 10000`, newer
/// ones with `5000`.
pub fn derive_pressure_in_place(
    table: &mut VerticalAllocationTable,
    sigma_key: &str,
    pressure_key: &str,
    top: f64,
    surface: f64,
) -> Result<()> {
    let pressure = table
        .require(sigma_key)?
        .iter()
        .map(|&s| sigma_to_pressure(s, top, surface))
        .collect();
    table.set_column(pressure_key, pressure)
}

/// Copying variant of [`derive_pressure_in_place`]; `table` is left untouched.
pub fn derive_pressure(
    table: &VerticalAllocationTable,
    sigma_key: &str,
    pressure_key: &str,
    top: f64,
    surface: f64,
) -> Result<VerticalAllocationTable> {
    let mut out = table.clone();
    derive_pressure_in_place(&mut out, sigma_key, pressure_key, top, surface)?;
    Ok(out)
}
