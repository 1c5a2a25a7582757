pub mod config;
pub mod knowledge_base;

pub use config::Config;
pub use knowledge_base::*;
