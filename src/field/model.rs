//! In-memory gridded field with IOAPI-style vertical metadata.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayD, Axis, IxDyn, concatenate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TSTEP: &str = "TSTEP";
pub const LAY: &str = "LAY";
pub const ROW: &str = "ROW";
pub const COL: &str = "COL";

/// One named data array and the names of its dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub data: ArrayD<f32>,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub long_name: String,
}

impl Variable {
    pub fn new(dims: &[&str], data: ArrayD<f32>) -> Result<Self> {
        let var = Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data,
            units: String::new(),
            long_name: String::new(),
        };
        var.check_shape("<new>")?;
        Ok(var)
    }

    pub fn axis(&self, dim: &str) -> Option<Axis> {
        self.dims.iter().position(|d| d == dim).map(Axis)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis(dim).is_some()
    }

    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis(dim).map(|ax| self.data.len_of(ax))
    }

    fn check_shape(&self, name: &str) -> Result<()> {
        if self.dims.len() != self.data.ndim() {
            return Err(Error::BadVariable {
                variable: name.to_string(),
                reason: format!(
                    "{} dimension names for a {}-d array",
                    self.dims.len(),
                    self.data.ndim()
                ),
            });
        }
        Ok(())
    }
}

/// A collection of `TSTEP x LAY x ROW x COL` variables sharing one vertical grid.
///
/// `tflag` is the per-step `[date, time]` stamp; it is carried along but
/// never scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriddedField {
    #[serde(rename = "VGLVLS")]
    pub vglvls: Vec<f32>,
    #[serde(rename = "NLAYS")]
    pub nlays: usize,
    #[serde(rename = "VGTOP", default)]
    pub vgtop: f32,
    #[serde(rename = "TFLAG")]
    pub tflag: Array2<i32>,
    pub variables: BTreeMap<String, Variable>,
    #[serde(default)]
    pub attrs: BTreeMap<String, serde_json::Value>,
}

impl GriddedField {
    pub fn ntsteps(&self) -> usize {
        self.tflag.nrows()
    }

    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    /// Names of every variable that carries the `LAY` dimension.
    pub fn eligible_variables(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|(_, v)| v.has_dim(LAY))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// `VGLVLS` must hold `NLAYS + 1` edges and every layered variable `NLAYS` layers.
    pub fn check_vertical_metadata(&self) -> Result<()> {
        if self.vglvls.len() != self.nlays + 1 {
            return Err(Error::InvalidGrid(format!(
                "VGLVLS has {} edges but NLAYS is {}",
                self.vglvls.len(),
                self.nlays
            )));
        }
        for (name, var) in &self.variables {
            if let Some(n) = var.len_of(LAY) {
                if n != self.nlays {
                    return Err(Error::InvalidGrid(format!(
                        "variable {} has {} layers but NLAYS is {}",
                        name, n, self.nlays
                    )));
                }
            }
        }
        Ok(())
    }

    /// Structural checks applied to every field read from disk.
    pub fn validate(&self) -> Result<()> {
        if self.tflag.ncols() != 2 {
            return Err(Error::BadVariable {
                variable: "TFLAG".into(),
                reason: format!("expected 2 columns, got {}", self.tflag.ncols()),
            });
        }
        for (name, var) in &self.variables {
            var.check_shape(name)?;
            if let Some(nt) = var.len_of(TSTEP) {
                if nt != self.ntsteps() {
                    return Err(Error::BadVariable {
                        variable: name.clone(),
                        reason: format!("{} time steps, TFLAG has {}", nt, self.ntsteps()),
                    });
                }
            }
        }
        self.check_vertical_metadata()
    }

    /// Restrict to the named variables. Metadata and `tflag` are kept.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut variables = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            variables.insert(name.to_string(), self.variable(name)?.clone());
        }
        Ok(Self {
            variables,
            ..self.clone_meta()
        })
    }

    /// Remap the `LAY` dimension to `indices` (repeats allowed).
    ///
    /// Variables without `LAY` pass through. `NLAYS` follows the new extent;
    /// `VGLVLS` is left for the caller to rewrite.
    pub fn slice_layers(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.nlays) {
            return Err(Error::LayerIndex {
                index,
                nlays: self.nlays,
            });
        }
        let mut variables = BTreeMap::new();
        for (name, var) in &self.variables {
            let mut out = var.clone();
            if let Some(ax) = var.axis(LAY) {
                out.data = var.data.select(ax, indices);
            }
            variables.insert(name.clone(), out);
        }
        Ok(Self {
            nlays: indices.len(),
            variables,
            ..self.clone_meta()
        })
    }

    /// Concatenate `self` and `others` along `axis` (only `TSTEP` is supported).
    ///
    /// A variable missing from one part is zero-filled over that part's steps.
    /// A single part is returned as is, so its variables need no `TSTEP`.
    pub fn stack(&self, others: &[GriddedField], axis: &str) -> Result<Self> {
        if axis != TSTEP {
            return Err(Error::StackMismatch(format!("unsupported stack axis {}", axis)));
        }
        if others.is_empty() {
            return Ok(self.clone());
        }
        let parts: Vec<&GriddedField> = std::iter::once(self).chain(others).collect();
        for part in &parts[1..] {
            if part.nlays != self.nlays || part.vglvls != self.vglvls {
                return Err(Error::StackMismatch(
                    "parts disagree on vertical grid".into(),
                ));
            }
        }

        let tflags: Vec<_> = parts.iter().map(|p| p.tflag.view()).collect();
        let tflag = concatenate(Axis(0), &tflags)
            .map_err(|e| Error::StackMismatch(format!("TFLAG: {}", e)))?;

        let mut templates: BTreeMap<&str, &Variable> = BTreeMap::new();
        for part in &parts {
            for (name, var) in &part.variables {
                templates.entry(name.as_str()).or_insert(var);
            }
        }

        let mut variables = BTreeMap::new();
        for (name, template) in templates {
            let ax = template.axis(TSTEP).ok_or_else(|| {
                Error::StackMismatch(format!("variable {} has no {} dimension", name, TSTEP))
            })?;
            let mut pieces: Vec<ArrayD<f32>> = Vec::with_capacity(parts.len());
            for part in &parts {
                match part.variables.get(name) {
                    Some(var) if var.dims == template.dims => pieces.push(var.data.clone()),
                    Some(_) => {
                        return Err(Error::StackMismatch(format!(
                            "variable {} has different dimensions across parts",
                            name
                        )));
                    }
                    None => {
                        let mut shape = template.data.shape().to_vec();
                        shape[ax.index()] = part.ntsteps();
                        pieces.push(ArrayD::zeros(IxDyn(&shape)));
                    }
                }
            }
            let views: Vec<_> = pieces.iter().map(|p| p.view()).collect();
            let data = concatenate(ax, &views)
                .map_err(|e| Error::StackMismatch(format!("variable {}: {}", name, e)))?;
            variables.insert(
                name.to_string(),
                Variable {
                    data,
                    ..template.clone()
                },
            );
        }

        Ok(Self {
            tflag,
            variables,
            ..self.clone_meta()
        })
    }

    /// Copy of everything except the variables.
    fn clone_meta(&self) -> Self {
        Self {
            vglvls: self.vglvls.clone(),
            nlays: self.nlays,
            vgtop: self.vgtop,
            tflag: self.tflag.clone(),
            variables: BTreeMap::new(),
            attrs: self.attrs.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::{Array, array};
    use pretty_assertions::assert_eq;

    /// Single-layer field, `nt x 1 x 2 x 2`, one variable per `(name, value)`.
    pub(crate) fn surface_field(nt: usize, vars: &[(&str, f32)]) -> GriddedField {
        let mut variables = BTreeMap::new();
        for &(name, value) in vars {
            let data = Array::from_elem(IxDyn(&[nt, 1, 2, 2]), value);
            variables.insert(
                name.to_string(),
                Variable::new(&[TSTEP, LAY, ROW, COL], data).unwrap(),
            );
        }
        let tflag = Array2::from_shape_fn((nt, 2), |(t, c)| {
            if c == 0 { 2016001 } else { (t as i32) * 10000 }
        });
        GriddedField {
            vglvls: vec![1.0, 0.995],
            nlays: 1,
            vgtop: 5000.0,
            tflag,
            variables,
            attrs: BTreeMap::new(),
        }
    }

    #[test]
    fn eligible_variables_need_lay() {
        let mut f = surface_field(1, &[("NOX", 1.0), ("CO", 2.0)]);
        let flat = Variable::new(&[TSTEP, ROW, COL], ArrayD::zeros(IxDyn(&[1, 2, 2]))).unwrap();
        f.variables.insert("AREA".into(), flat);
        assert_eq!(f.eligible_variables(), vec!["CO".to_string(), "NOX".to_string()]);
    }

    #[test]
    fn subset_keeps_stamp_and_rejects_unknown_names() {
        let f = surface_field(2, &[("NOX", 1.0), ("CO", 2.0)]);
        let s = f.subset(&["NOX"]).unwrap();
        assert_eq!(s.variables.keys().collect::<Vec<_>>(), vec!["NOX"]);
        assert_eq!(s.tflag, f.tflag);
        assert!(matches!(f.subset(&["SO2"]), Err(Error::UnknownVariable(v)) if v == "SO2"));
    }

    #[test]
    fn slice_layers_replicates_and_checks_bounds() {
        let f = surface_field(1, &[("NOX", 3.0)]);
        let s = f.slice_layers(&[0, 0, 0]).unwrap();
        assert_eq!(s.nlays, 3);
        assert_eq!(s.variables["NOX"].data.shape(), &[1, 3, 2, 2]);
        assert!(matches!(
            f.slice_layers(&[0, 1]),
            Err(Error::LayerIndex { index: 1, nlays: 1 })
        ));
    }

    #[test]
    fn stack_zero_fills_missing_variables() {
        let a = surface_field(1, &[("NOX", 1.0)]);
        let b = surface_field(1, &[("CO", 2.0)]);
        let s = a.stack(&[b], TSTEP).unwrap();
        assert_eq!(s.ntsteps(), 2);
        let nox = &s.variables["NOX"].data;
        assert_eq!(nox.shape(), &[2, 1, 2, 2]);
        assert_eq!(nox.index_axis(Axis(0), 0).sum(), 4.0);
        assert_eq!(nox.index_axis(Axis(0), 1).sum(), 0.0);
        let co = &s.variables["CO"].data;
        assert_eq!(co.index_axis(Axis(0), 0).sum(), 0.0);
        assert_eq!(co.index_axis(Axis(0), 1).sum(), 8.0);
        assert_eq!(s.tflag, array![[2016001, 0], [2016001, 0]]);
    }

    #[test]
    fn stack_of_one_part_needs_no_time_axis() {
        let mut f = surface_field(1, &[]);
        let ht = Variable::new(&[LAY, ROW, COL], ArrayD::from_elem(IxDyn(&[1, 2, 2]), 5.0)).unwrap();
        f.variables.insert("HT".into(), ht);
        assert_eq!(f.stack(&[], TSTEP).unwrap(), f);

        let other = f.clone();
        assert!(matches!(f.stack(&[other], TSTEP), Err(Error::StackMismatch(_))));
    }

    #[test]
    fn stack_rejects_mismatched_grids_and_axes() {
        let a = surface_field(1, &[("NOX", 1.0)]);
        let mut b = a.clone();
        b.vglvls = vec![1.0, 0.9];
        assert!(matches!(a.stack(&[b], TSTEP), Err(Error::StackMismatch(_))));
        assert!(matches!(a.stack(&[], LAY), Err(Error::StackMismatch(_))));
    }

    #[test]
    fn validate_catches_inconsistent_metadata() {
        let mut f = surface_field(1, &[("NOX", 1.0)]);
        assert!(f.validate().is_ok());
        f.nlays = 2;
        assert!(matches!(f.validate(), Err(Error::InvalidGrid(_))));
    }
}
