pub mod adapters;
pub mod config;
pub mod errors;
pub mod http;
pub mod jobs;
pub mod ports;
pub mod processing;
pub mod shared;
pub mod workers;
