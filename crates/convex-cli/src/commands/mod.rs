pub mod config;
pub mod generate;
pub mod manifest;
pub mod scan;
