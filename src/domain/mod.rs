pub mod listing;
pub mod parse;

pub use listing::{ListingType, PreparedListing, RawListing};
