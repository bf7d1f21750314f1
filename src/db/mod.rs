pub mod connection;
pub mod listings;
pub mod scrapes;

pub use connection::Database;
