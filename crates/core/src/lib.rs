pub mod config;
pub mod error;
pub mod limits;
pub mod render;
pub mod types;

pub use config::AppConfig;
pub use error::{OutreachError, OutreachResult};
