pub mod cache;
pub mod concurrency;
pub mod service;

pub use log;
