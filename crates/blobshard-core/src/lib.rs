pub mod config;
pub mod error;
pub mod path;
pub mod router;
pub mod types;
