//! Listing watch core: pure domain types and novelty bookkeeping.
mod filter;
mod listing;
mod seen;
mod summary;
mod target;

pub use filter::KeywordFilter;
pub use listing::{format_listing_message, ListingRecord, PRICE_UNAVAILABLE};
pub use seen::{partition_new, SeenSet};
pub use summary::{PageSource, PersistOutcome, RunSummary, TargetReport};
pub use target::{QueryTarget, TargetError};
