//! Input schema handling
//!
//! This module defines raw input records, the synonym tables that map their
//! inconsistent field names onto the pipeline's semantic fields, and the
//! loaders for the record-list and tabular input forms.

mod adapter;
mod raw_record;

pub use adapter::*;
pub use raw_record::*;
