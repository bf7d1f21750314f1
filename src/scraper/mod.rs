mod models;
mod scraper;
mod scraper_error;
pub mod sources;

pub use scraper::ListingScraper;
pub use scraper_error::ScraperError;
pub use sources::{Source, ALL_SOURCES};
