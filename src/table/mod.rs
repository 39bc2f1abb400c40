//! Vertical allocation tables: in-memory representation and delimited-text I/O.

pub mod frame;
pub mod parse;

pub use frame::{Column, VerticalAllocationTable};
pub use parse::{ParseOptions, load_table, write_table};
