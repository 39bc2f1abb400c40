use crate::error::{Error, Result};

/// One named series of the allocation table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Rows are vertical levels, columns are named series (sigma, pressure,
/// and one weight column per sector). Column order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalAllocationTable {
    columns: Vec<Column>,
}

impl VerticalAllocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs; all columns must share one
    /// length and names must be unique.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Vec<f64>)>,
    ) -> Result<Self> {
        let mut table = Self::new();
        for (name, values) in columns {
            let name = name.into();
            if table.contains(&name) {
                return Err(Error::InvalidConfig(format!("duplicate column {}", name)));
            }
            table.set_column(name, values)?;
        }
        Ok(table)
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`column`](Self::column) but a missing name is a lookup failure.
    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Overwrite `name` in place, or append it as the last column.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.nrows() {
            return Err(Error::InvalidConfig(format!(
                "column {} has {} rows, table has {}",
                name,
                values.len(),
                self.nrows()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Keep only the rows whose mask entry is true.
    pub fn filter_rows(&self, keep: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: c
                    .values
                    .iter()
                    .zip(keep)
                    .filter_map(|(v, &k)| k.then_some(*v))
                    .collect(),
            })
            .collect();
        Self { columns }
    }

    /// Sum of each row over every column not named in `exclude`.
    pub fn row_sums_excluding(&self, exclude: &[String]) -> Vec<f64> {
        let mut sums = vec![0.0; self.nrows()];
        for col in self.columns.iter().filter(|c| !exclude.contains(&c.name)) {
            for (s, v) in sums.iter_mut().zip(&col.values) {
                *s += v;
            }
        }
        sums
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> VerticalAllocationTable {
        VerticalAllocationTable::from_columns([
            ("Sigma", vec![0.0, 0.5, 1.0]),
            ("elev", vec![0.2, 0.3, 0.5]),
            ("ground", vec![0.0, 0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn set_column_appends_then_overwrites_in_place() {
        let mut t = sample();
        t.set_column("Pressure", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            t.column_names().collect::<Vec<_>>(),
            vec!["Sigma", "elev", "ground", "Pressure"]
        );
        t.set_column("elev", vec![9.0, 9.0, 9.0]).unwrap();
        assert_eq!(t.ncols(), 4);
        assert_eq!(t.column("elev").unwrap(), &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn ragged_column_is_rejected() {
        let mut t = sample();
        assert!(t.set_column("bad", vec![1.0]).is_err());
    }

    #[test]
    fn from_columns_rejects_repeated_names() {
        let err = VerticalAllocationTable::from_columns([
            ("Sigma", vec![0.0]),
            ("ground", vec![1.0]),
            ("ground", vec![0.0]),
        ])
        .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn require_reports_missing_column() {
        let t = sample();
        assert!(matches!(t.require("Alt"), Err(Error::MissingColumn(c)) if c == "Alt"));
    }

    #[test]
    fn filter_rows_and_row_sums() {
        let t = sample();
        let sums = t.row_sums_excluding(&["Sigma".to_string()]);
        assert_eq!(sums, vec![0.2, 0.3, 1.5]);

        let kept = t.filter_rows(&[true, false, true]);
        assert_eq!(kept.nrows(), 2);
        assert_eq!(kept.column("elev").unwrap(), &[0.2, 0.5]);
    }
}
