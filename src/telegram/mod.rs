pub mod handler;
pub mod results;
