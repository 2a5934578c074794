pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod search;
pub mod server;
pub mod session;
pub mod snippet;
