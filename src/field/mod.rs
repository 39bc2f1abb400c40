//! Gridded fields: the data model, disk I/O, and single-layer expansion.

pub mod expand;
pub mod io;
pub mod model;

pub use expand::{expand, expand_with_profile};
pub use io::{FieldFormat, SaveOptions, open_field, save_field};
pub use model::{COL, GriddedField, LAY, ROW, TSTEP, Variable};
