//! Records, collections and the identity-keyed merge.

mod collection;
mod merge;
mod records_model;

pub use collection::Collection;
pub use merge::{merge, merge_record, union_entries};
pub use records_model::*;
