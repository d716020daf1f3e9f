pub mod connection;
pub mod explorer;
pub mod listings;

pub use connection::Database;
