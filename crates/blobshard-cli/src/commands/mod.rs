pub mod blob;
pub mod cleanup;
pub mod config;
pub mod container;
pub mod get;
pub mod init;
pub mod ls;
pub mod put;
pub mod route;
pub mod store;
