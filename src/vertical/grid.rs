use crate::error::{Error, Result};

/// Target vertical grid: `n + 1` sigma edges plus the pressures that anchor them.
///
/// `vglvls[0]` is the surface edge and is never interpolated at; the
/// remaining `n` values are layer tops.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    vglvls: Vec<f64>,
    vgtop: f64,
    psfc: f64,
}

impl GridSpec {
    pub fn new(vglvls: Vec<f64>, vgtop: f64, psfc: f64) -> Result<Self> {
        if vglvls.len() < 2 {
            return Err(Error::InvalidGrid(format!(
                "need at least 2 edges, got {}",
                vglvls.len()
            )));
        }
        if vglvls.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidGrid("edges must be finite".into()));
        }
        let decreasing = vglvls.windows(2).all(|w| w[1] < w[0]);
        let increasing = vglvls.windows(2).all(|w| w[1] > w[0]);
        if !decreasing && !increasing {
            return Err(Error::InvalidGrid(format!(
                "edges must be strictly monotonic: {:?}",
                vglvls
            )));
        }
        if !(psfc > vgtop) {
            return Err(Error::InvalidGrid(format!(
                "surface pressure {} must exceed top pressure {}",
                psfc, vgtop
            )));
        }
        Ok(Self {
            vglvls,
            vgtop,
            psfc,
        })
    }

    pub fn vglvls(&self) -> &[f64] {
        &self.vglvls
    }

    pub fn vgtop(&self) -> f64 {
        self.vgtop
    }

    pub fn psfc(&self) -> f64 {
        self.psfc
    }

    pub fn nlays(&self) -> usize {
        self.vglvls.len() - 1
    }

    pub fn surface_edge(&self) -> f64 {
        self.vglvls[0]
    }

    /// Layer-top edges, `vglvls[1..]`. Sigma edges are already in the
    /// normalized coordinate used by [`normalize`](Self::normalize).
    pub fn layer_tops(&self) -> &[f64] {
        &self.vglvls[1..]
    }

    /// Map a pressure (Pa) onto `0` at `vgtop` and `1` at `psfc`.
    pub fn normalize(&self, pressure: f64) -> f64 {
        (pressure - self.vgtop) / (self.psfc - self.vgtop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ioapi_style_decreasing_edges() {
        let g = GridSpec::new(vec![1.0, 0.8, 0.5, 0.0], 5000.0, 101325.0).unwrap();
        assert_eq!(g.nlays(), 3);
        assert_eq!(g.layer_tops(), &[0.8, 0.5, 0.0]);
        assert_eq!(g.normalize(5000.0), 0.0);
        assert_eq!(g.normalize(101325.0), 1.0);
    }

    #[test]
    fn rejects_bad_grids() {
        assert!(GridSpec::new(vec![1.0], 5000.0, 101325.0).is_err());
        assert!(GridSpec::new(vec![1.0, 0.5, 0.7], 5000.0, 101325.0).is_err());
        assert!(GridSpec::new(vec![1.0, 0.5], 101325.0, 5000.0).is_err());
        assert!(GridSpec::new(vec![1.0, f64::NAN], 5000.0, 101325.0).is_err());
    }
}
