pub mod listing;
pub mod property;
