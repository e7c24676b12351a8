pub mod config;
pub mod extract;
pub mod loader;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod transform;
pub mod utils;
