pub mod apps;
pub mod config;
pub mod generate;
pub mod models;
