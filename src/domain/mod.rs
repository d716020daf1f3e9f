pub mod listing;
pub mod logic;

pub use listing::{CanonicalBatch, Listing, RawBatch, RawRecord};
