//! Engagement ingestion: maps asynchronous provider webhook events onto
//! stored emails and applies the corresponding state transition.

pub mod processor;

pub use processor::{EngagementProcessor, EventDisposition};
