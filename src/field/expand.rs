//! Expansion of single-layer fields into layered fields.

use crate::error::{Error, Result};
use crate::field::model::{GriddedField, LAY};
use crate::vertical::InterpolatedProfile;

/// Replicate the single layer of `field` once per fraction and scale layer
/// `k` by `fractions[k]`.
///
/// `vglvls` becomes the new `VGLVLS` and must hold `fractions.len() + 1`
/// edges. Every variable must carry a `LAY` dimension of extent 1; the
/// `TFLAG` stamp is copied unscaled.
pub fn expand(field: &GriddedField, fractions: &[f64], vglvls: &[f64]) -> Result<GriddedField> {
    let nz = fractions.len();
    if vglvls.len() != nz + 1 {
        return Err(Error::FractionLength {
            expected: vglvls.len().saturating_sub(1),
            got: nz,
        });
    }
    for (name, var) in &field.variables {
        match var.len_of(LAY) {
            None => return Err(Error::MissingLayerDim(name.clone())),
            Some(1) => {}
            Some(got) => {
                return Err(Error::LayerExtent {
                    variable: name.clone(),
                    got,
                });
            }
        }
    }

    let mut out = field.slice_layers(&vec![0; nz])?;
    for var in out.variables.values_mut() {
        let Some(ax) = var.axis(LAY) else { continue };
        for (mut layer, &frac) in var.data.axis_iter_mut(ax).zip(fractions) {
            layer.mapv_inplace(|v| (f64::from(v) * frac) as f32);
        }
    }
    out.vglvls = vglvls.iter().map(|&v| v as f32).collect();
    out.nlays = nz;
    Ok(out)
}

/// Expand with the `sector` column of `profile`.
///
/// `VGLVLS` is `surface_edge` followed by the profile's layer tops, so a
/// pruned profile still yields consistent vertical metadata.
pub fn expand_with_profile(
    field: &GriddedField,
    profile: &InterpolatedProfile,
    sector: &str,
    surface_edge: f64,
) -> Result<GriddedField> {
    let fractions = profile.fractions(sector)?;
    let vglvls: Vec<f64> = std::iter::once(surface_edge)
        .chain(profile.sigma()?.iter().copied())
        .collect();
    tracing::debug!(sector, layers = fractions.len(), "expanding sector");
    expand(field, fractions, &vglvls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::model::tests::surface_field;
    use crate::field::model::{ROW, TSTEP, Variable};
    use ndarray::{ArrayD, Axis, IxDyn};
    use pretty_assertions::assert_eq;

    #[test]
    fn layers_scale_by_fraction_and_sum_back() {
        let f = surface_field(1, &[("NOX", 10.0)]);
        let out = expand(&f, &[0.25, 0.75], &[1.0, 0.8, 0.5]).unwrap();
        assert_eq!(out.nlays, 2);
        assert_eq!(out.vglvls, vec![1.0f32, 0.8, 0.5]);
        let nox = &out.variables["NOX"].data;
        assert_eq!(nox.shape(), &[1, 2, 2, 2]);
        assert_eq!(nox[[0, 0, 1, 1]], 2.5);
        assert_eq!(nox[[0, 1, 0, 1]], 7.5);
        let column_total = nox.sum_axis(Axis(1));
        assert!(column_total.iter().all(|&v| (v - 10.0).abs() < 1e-5));
        assert!(out.check_vertical_metadata().is_ok());
    }

    #[test]
    fn zero_fractions_give_all_zero_layers() {
        let f = surface_field(2, &[("CO", 4.0)]);
        let out = expand(&f, &[0.0, 0.0, 0.0], &[1.0, 0.8, 0.5, 0.0]).unwrap();
        assert!(out.variables["CO"].data.iter().all(|&v| v == 0.0));
        assert_eq!(out.tflag, f.tflag);
    }

    #[test]
    fn input_field_is_not_mutated() {
        let f = surface_field(1, &[("NOX", 10.0)]);
        let before = f.clone();
        let _ = expand(&f, &[0.5, 0.5], &[1.0, 0.8, 0.5]).unwrap();
        assert_eq!(f, before);
    }

    #[test]
    fn shape_mismatches_are_rejected() {
        let f = surface_field(1, &[("NOX", 1.0)]);
        assert!(matches!(
            expand(&f, &[0.5, 0.5], &[1.0, 0.5]),
            Err(Error::FractionLength { expected: 1, got: 2 })
        ));

        let mut flat = f.clone();
        flat.variables.insert(
            "AREA".into(),
            Variable::new(&[TSTEP, ROW], ArrayD::zeros(IxDyn(&[1, 2]))).unwrap(),
        );
        assert!(matches!(
            expand(&flat, &[1.0], &[1.0, 0.5]),
            Err(Error::MissingLayerDim(v)) if v == "AREA"
        ));

        let layered = f.slice_layers(&[0, 0]).unwrap();
        assert!(matches!(
            expand(&layered, &[1.0], &[1.0, 0.5]),
            Err(Error::LayerExtent { got: 2, .. })
        ));
    }
}
