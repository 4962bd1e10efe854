pub mod config;
pub mod dashboard;
pub mod grid;
pub mod model;
pub mod sync;
pub mod twitter;
pub mod web;
