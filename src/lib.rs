pub mod error;
pub mod inline;
pub mod models;
pub mod router;
pub mod store;
