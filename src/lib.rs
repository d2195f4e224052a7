pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod providers;
pub mod reading;
pub mod summary;
