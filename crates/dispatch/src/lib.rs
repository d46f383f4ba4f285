//! Campaign dispatch loop: the periodic task that drains queued emails
//! per active campaign, subject to rate limits and the send window.

pub mod dispatcher;

pub use dispatcher::{CampaignDispatcher, CampaignRunResult, DispatchReport};
