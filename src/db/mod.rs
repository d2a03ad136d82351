pub mod connection;
pub mod properties;
pub mod scrapes;

pub use connection::{init_db, Database};
