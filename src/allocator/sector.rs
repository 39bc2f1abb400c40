//! Sector-to-variable assignment.
//!
//! Each sector names a profile column and the field variables allocated
//! with it. At most one sector may take the default remainder, i.e. every
//! layered variable not listed by another sector.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectorVariables {
    Explicit(Vec<String>),
    DefaultRemainder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    pub name: String,
    pub variables: SectorVariables,
}

impl Sector {
    pub fn explicit<S: Into<String>>(
        name: impl Into<String>,
        variables: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let variables = variables
            .into_iter()
            .map(|v| -> String { v.into() })
            .filter(|v| seen.insert(v.clone()))
            .collect();
        Self {
            name: name.into(),
            variables: SectorVariables::Explicit(variables),
        }
    }

    pub fn default_remainder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: SectorVariables::DefaultRemainder,
        }
    }

    pub fn is_default(&self) -> bool {
        self.variables == SectorVariables::DefaultRemainder
    }
}

/// A sector with its final variable list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSector {
    pub name: String,
    pub variables: Vec<String>,
}

/// Ordered, validated list of sectors. Order fixes the stacking order of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorAssignment {
    sectors: Vec<Sector>,
}

impl SectorAssignment {
    pub fn new(sectors: Vec<Sector>) -> Result<Self> {
        if sectors.is_empty() {
            return Err(Error::EmptyAssignment);
        }

        let mut names = BTreeSet::new();
        for s in &sectors {
            if !names.insert(s.name.as_str()) {
                return Err(Error::DuplicateSector(s.name.clone()));
            }
        }

        let defaults: Vec<String> = sectors
            .iter()
            .filter(|s| s.is_default())
            .map(|s| s.name.clone())
            .collect();
        if defaults.len() > 1 {
            return Err(Error::MultipleDefaultSectors(defaults));
        }

        let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
        for s in &sectors {
            if let SectorVariables::Explicit(vars) = &s.variables {
                for v in vars {
                    if let Some(prev) = owner.insert(v.as_str(), s.name.as_str()) {
                        return Err(Error::OverlappingSector {
                            variable: v.clone(),
                            first: prev.to_string(),
                            second: s.name.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { sectors })
    }

    /// Every eligible variable goes to `name`.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            sectors: vec![Sector::default_remainder(name)],
        }
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Fill in the default sector from `eligible`, keeping declaration order.
    pub fn resolve(&self, eligible: &[String]) -> Vec<ResolvedSector> {
        let assigned: BTreeSet<&str> = self
            .sectors
            .iter()
            .filter_map(|s| match &s.variables {
                SectorVariables::Explicit(vars) => Some(vars.iter().map(String::as_str)),
                SectorVariables::DefaultRemainder => None,
            })
            .flatten()
            .collect();

        self.sectors
            .iter()
            .map(|s| {
                let variables = match &s.variables {
                    SectorVariables::Explicit(vars) => vars.clone(),
                    SectorVariables::DefaultRemainder => eligible
                        .iter()
                        .filter(|v| !assigned.contains(v.as_str()))
                        .cloned()
                        .collect(),
                };
                ResolvedSector {
                    name: s.name.clone(),
                    variables,
                }
            })
            .collect()
    }
}

/// Parse a command-line sector: `NAME=VAR,VAR` lists variables, a bare
/// `NAME` (or `NAME=*`) takes the default remainder.
pub fn parse_sector_arg(arg: &str) -> Result<Sector> {
    let re = Regex::new(r"^\s*([^=,\s]+)\s*(?:=\s*(.*?))?\s*$")
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let caps = re
        .captures(arg)
        .ok_or_else(|| Error::InvalidConfig(format!("cannot parse sector {:?}", arg)))?;
    let name = &caps[1];

    match caps.get(2).map(|m| m.as_str()) {
        None | Some("*") => Ok(Sector::default_remainder(name)),
        Some(list) => {
            let vars: Vec<&str> = list
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            if vars.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "sector {} lists no variables",
                    name
                )));
            }
            Ok(Sector::explicit(name, vars))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_sector_takes_unassigned_variables() {
        let a = SectorAssignment::new(vec![
            Sector::explicit("onroad", ["NOX"]),
            Sector::default_remainder("other"),
        ])
        .unwrap();
        let resolved = a.resolve(&names(&["CO", "NOX"]));
        assert_eq!(
            resolved,
            vec![
                ResolvedSector {
                    name: "onroad".into(),
                    variables: names(&["NOX"]),
                },
                ResolvedSector {
                    name: "other".into(),
                    variables: names(&["CO"]),
                },
            ]
        );
    }

    #[test]
    fn two_default_sectors_are_a_config_error() {
        let err = SectorAssignment::new(vec![
            Sector::default_remainder("a"),
            Sector::default_remainder("b"),
        ])
        .unwrap_err();
        assert!(err.is_config());
        assert!(matches!(err, Error::MultipleDefaultSectors(v) if v == names(&["a", "b"])));
    }

    #[test]
    fn overlapping_and_duplicate_sectors_are_rejected() {
        let err = SectorAssignment::new(vec![
            Sector::explicit("a", ["NOX", "CO"]),
            Sector::explicit("b", ["CO"]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::OverlappingSector { variable, .. } if variable == "CO"));

        let err = SectorAssignment::new(vec![
            Sector::explicit("a", ["NOX"]),
            Sector::default_remainder("a"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateSector(n) if n == "a"));

        assert!(matches!(
            SectorAssignment::new(vec![]),
            Err(Error::EmptyAssignment)
        ));
    }

    #[test]
    fn single_name_is_the_sole_default() {
        let a = SectorAssignment::single("LAYER1");
        let resolved = a.resolve(&names(&["CO", "NOX"]));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].variables, names(&["CO", "NOX"]));
    }

    #[test]
    fn sector_args_parse() {
        assert_eq!(
            parse_sector_arg("onroad = NOX, CO").unwrap(),
            Sector::explicit("onroad", ["NOX", "CO"])
        );
        assert_eq!(
            parse_sector_arg("other").unwrap(),
            Sector::default_remainder("other")
        );
        assert_eq!(
            parse_sector_arg("other=*").unwrap(),
            Sector::default_remainder("other")
        );
        assert!(parse_sector_arg("bad=").is_err());
        assert!(parse_sector_arg("=NOX").is_err());
    }
}
