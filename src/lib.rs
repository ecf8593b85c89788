pub mod analyzers;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod pipeline;
