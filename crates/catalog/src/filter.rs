//! Record filtering.
//!
//! Turns the filter panel state and search phrase into a predicate chain and
//! runs it over the store in store order. Sorting happens afterwards.

mod duplicates;
mod options;
mod predicate;

pub use duplicates::retain_duplicates;
pub use options::{
    ColorFilter, FilterOptions, MaintenanceFilter, OriginFilter, PreviewFilter, UsageFilter,
};
pub use predicate::{group_value, FilterOutcome, RecordFilter};
