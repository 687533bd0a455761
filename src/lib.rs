pub mod api;
pub mod config;
pub mod inference;
pub mod models;
pub mod system;
