//! Vertical allocation of single-layer gridded fields.
//!
//! A table of per-sector layer fractions, defined on a reference sigma or
//! pressure grid, is interpolated onto a target model's layers once; each
//! single-layer field is then spread over those layers sector by sector and
//! the sector results are stacked into one output field.

pub mod allocator;
pub mod config;
pub mod error;
pub mod field;
pub mod table;
pub mod vertical;

pub use allocator::{AllocatorOptions, Sector, SectorAssignment, VerticalAllocator};
pub use config::AllocationConfig;
pub use error::{Error, Result};
pub use field::GriddedField;
pub use table::VerticalAllocationTable;
